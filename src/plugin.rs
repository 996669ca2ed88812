//! 插件引导：菜单注册与过滤器命名空间

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Filter, FILTER_IDX};
use crate::tree::paginate::VIEW_ACTION;

/// 菜单项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub submenu: Vec<MenuItem>,
}

impl MenuItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: None,
            submenu: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn find(&self, label: &str) -> Option<&MenuItem> {
        self.submenu.iter().find(|item| item.label == label)
    }

    /// 插入到 `after` 之后；找不到 `after` 时追加到末尾
    pub fn insert_after(&mut self, after: &str, item: MenuItem) {
        match self.submenu.iter().position(|existing| existing.label == after) {
            Some(index) => self.submenu.insert(index + 1, item),
            None => self.submenu.push(item),
        }
    }
}

/// 主菜单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Menu {
    items: Vec<MenuItem>,
}

impl Menu {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }

    pub fn find(&self, label: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.label == label)
    }

    /// 查找顶层菜单，不存在时追加
    pub fn find_or_add(&mut self, label: &str) -> &mut MenuItem {
        let index = match self.items.iter().position(|item| item.label == label) {
            Some(index) => index,
            None => {
                self.items.push(MenuItem::new(label));
                self.items.len() - 1
            }
        };
        &mut self.items[index]
    }

    /// 平台自带的监控菜单
    pub fn monitoring_default() -> Self {
        let mut menu = Menu::default();
        let monitoring = menu.find_or_add("Monitoring");
        for (label, action) in [
            ("Dashboard", "dashboard.view"),
            ("Problems", "problem.view"),
            ("Hosts", "host.view"),
            ("Latest data", "latest.view"),
            ("Maps", "map.view"),
            ("Discovery", "discovery.view"),
        ] {
            monitoring.submenu.push(MenuItem::new(label).with_action(action));
        }
        menu
    }
}

/// 主机树插件
pub struct PluginModule;

impl PluginModule {
    pub const MENU_LABEL: &'static str = "Hosts tree";
    const PARENT_MENU: &'static str = "Monitoring";
    const ANCHOR_ITEM: &'static str = "Hosts";

    /// 在「Monitoring」子菜单的「Hosts」之后加入「Hosts tree」，重复调用不会重复添加
    pub fn init(menu: &mut Menu) {
        let monitoring = menu.find_or_add(Self::PARENT_MENU);
        if monitoring.find(Self::MENU_LABEL).is_some() {
            return;
        }
        monitoring.insert_after(
            Self::ANCHOR_ITEM,
            MenuItem::new(Self::MENU_LABEL).with_action(VIEW_ACTION),
        );
        tracing::debug!(action = VIEW_ACTION, "Menu item registered");
    }

    /// 本插件使用的过滤器命名空间
    pub fn register_filters(registry: &mut FilterRegistry) {
        registry.register(FILTER_IDX, Filter::default());
    }
}

/// 过滤器命名空间 → 默认过滤条件
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Filter>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, idx: impl Into<String>, defaults: Filter) {
        self.filters.insert(idx.into(), defaults);
    }

    pub fn defaults(&self, idx: &str) -> Option<&Filter> {
        self.filters.get(idx)
    }

    pub fn contains(&self, idx: &str) -> bool {
        self.filters.contains_key(idx)
    }
}
