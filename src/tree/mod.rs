//! 主机组树
//!
//! 构建（builder）→ 问题汇总（aggregate）→ 主机收集（collector）→ 分页（paginate）。
//! 所有结构只在一次请求内存在。

pub mod aggregate;
pub mod builder;
pub mod collector;
pub mod natural;
pub mod paginate;
pub mod path;
pub mod visibility;

pub use aggregate::ProblemAggregator;
pub use builder::GroupTreeBuilder;
pub use collector::{HostCollector, HostMap};
pub use paginate::Paginator;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Group, GroupId, SortOrder};
use natural::natural_cmp;

/// 以组全名为键的组树
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct GroupTree {
    groups: BTreeMap<String, Group>,
    #[serde(skip)]
    order: SortOrder,
}

impl GroupTree {
    pub fn new(groups: BTreeMap<String, Group>, order: SortOrder) -> Self {
        Self { groups, order }
    }

    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Group)> {
        self.groups.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Group)> {
        self.groups.iter_mut()
    }

    pub fn find_by_id(&self, id: GroupId) -> Option<&Group> {
        self.groups.values().find(|group| group.id == id)
    }

    /// 根组名，按排序方向以自然顺序排列
    pub fn roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self
            .groups
            .values()
            .filter(|group| group.is_root())
            .map(|group| group.name.clone())
            .collect();
        roots.sort_by(|a, b| self.order.apply(natural_cmp(a, b)));
        roots
    }

    /// 组本身及其所有祖先都处于展开状态
    pub fn is_visible(&self, name: &str) -> bool {
        let mut current = self.groups.get(name);
        while let Some(group) = current {
            if group.is_collapsed {
                return false;
            }
            current = path::parent(&group.name).and_then(|parent| self.groups.get(parent));
        }
        self.groups.contains_key(name)
    }

    /// 主机数汇总：每个组 = 直属主机 + 所有后代的主机
    ///
    /// 总是从直属数重新计算，重复调用结果不变。
    pub fn roll_up_host_counts(&mut self) {
        for root in self.roots() {
            self.accumulate_hosts(&root);
        }
    }

    fn accumulate_hosts(&mut self, name: &str) -> u64 {
        let Some(group) = self.groups.get(name) else {
            return 0;
        };
        let children = group.children.clone();
        let mut total = group.direct_hosts;

        for child in &children {
            total += self.accumulate_hosts(child);
        }

        if let Some(group) = self.groups.get_mut(name) {
            group.num_of_hosts = total;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlatGroup;

    #[test]
    fn test_visibility_requires_expanded_ancestors() {
        let flat = vec![
            FlatGroup::new(1, "a", 1),
            FlatGroup::new(2, "a/b", 1),
            FlatGroup::new(3, "a/b/c", 1),
        ];
        let expanded = [GroupId::Real(2), GroupId::Real(3)];
        let tree = GroupTreeBuilder::new(SortOrder::Asc).build(&flat, &expanded);

        assert!(!tree.is_visible("a"));
        assert!(!tree.is_visible("a/b"));
        assert!(!tree.is_visible("a/b/c"));
        assert!(!tree.is_visible("missing"));

        let expanded = [GroupId::Real(1), GroupId::Real(2), GroupId::Real(3)];
        let tree = GroupTreeBuilder::new(SortOrder::Asc).build(&flat, &expanded);
        assert!(tree.is_visible("a/b/c"));
    }

    #[test]
    fn test_roots_follow_sort_order() {
        let flat = vec![
            FlatGroup::new(1, "zone10", 1),
            FlatGroup::new(2, "zone2", 1),
            FlatGroup::new(3, "zone2/sub", 1),
        ];
        let asc = GroupTreeBuilder::new(SortOrder::Asc).build(&flat, &[]);
        assert_eq!(asc.roots(), vec!["zone2", "zone10"]);

        let desc = GroupTreeBuilder::new(SortOrder::Desc).build(&flat, &[]);
        assert_eq!(desc.roots(), vec!["zone10", "zone2"]);
    }

    #[test]
    fn test_roll_up_is_idempotent() {
        let flat = vec![FlatGroup::new(1, "a", 1), FlatGroup::new(2, "a/b", 2)];
        let mut tree = GroupTreeBuilder::new(SortOrder::Asc).build(&flat, &[]);
        tree.roll_up_host_counts();
        tree.roll_up_host_counts();
        assert_eq!(tree.get("a").unwrap().num_of_hosts, 3);
    }

    #[test]
    fn test_find_by_id() {
        let flat = vec![FlatGroup::new(7, "x/y", 1)];
        let tree = GroupTreeBuilder::new(SortOrder::Asc).build(&flat, &[]);
        assert_eq!(tree.find_by_id(GroupId::Real(7)).unwrap().name, "x/y");
        assert!(tree.find_by_id(GroupId::Real(8)).is_none());
    }
}
