//! 主机树视图服务
//!
//! 一次请求完成：组列表 → 构建组树 → 汇总问题数 → 收集可见主机 → 分页。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ViewConfig;
use crate::error::AppError;
use crate::models::{Filter, FlatGroup, GroupId, Paging};
use crate::repository::{ApiError, HostGroupQuery, MonitoringApi};
use crate::tree::{
    paginate::PageUrl, path, visibility, GroupTree, GroupTreeBuilder, HostCollector, HostMap,
    Paginator, ProblemAggregator,
};

/// 过滤器中已选组的展示项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedGroup {
    pub id: u64,
    pub name: String,
}

/// 交给渲染层的完整视图
#[derive(Debug, Serialize)]
pub struct HostTreeView {
    pub groups: GroupTree,
    /// 根组名，按当前排序方向
    pub roots: Vec<String>,
    /// 本页主机，以主机 ID 为键
    pub hosts: HostMap,
    pub paging: Paging,
    pub view_url: String,
    pub filter: Filter,
    pub groups_multiselect: Vec<SelectedGroup>,
    pub generated_at: DateTime<Utc>,
}

/// 切换展开状态后的结果
#[derive(Debug, Serialize)]
pub struct ToggleResult {
    pub expanded_groups: Vec<GroupId>,
    /// 逗号拼接形式，可直接写入 URL
    pub expanded_groups_param: String,
    pub view_url: String,
}

pub struct HostTreeService {
    api: Arc<dyn MonitoringApi>,
    view: ViewConfig,
}

impl HostTreeService {
    pub fn new(api: Arc<dyn MonitoringApi>, view: ViewConfig) -> Self {
        Self { api, view }
    }

    /// 组装一页主机树视图
    pub async fn build_view(&self, filter: &Filter, defaults: &Filter) -> Result<HostTreeView, AppError> {
        let started = Instant::now();
        let api = self.api.as_ref();

        let mut tree = self.load_tree(filter).await?;

        let direct = ProblemAggregator::new(api).direct_counts(&tree, filter).await?;
        ProblemAggregator::aggregate(&mut tree, &direct);

        let collector = HostCollector::new(api, self.view.search_limit);
        let mut collections = Vec::new();
        for root in tree.roots() {
            if !tree.is_visible(&root) {
                continue;
            }
            collections.push(collector.collect(&mut tree, &root, filter).await?);
        }

        let paginator = self.paginator();
        let (all_hosts, limit_exceeded) = paginator.concat(collections);
        let url = PageUrl::for_filter(self.view.base_url.as_str(), filter, defaults);
        let (hosts, paging) = paginator.paginate(filter.page, &all_hosts, limit_exceeded, &url);

        let groups_multiselect = self.selected_groups(&filter.groupids).await?;

        let elapsed = started.elapsed();
        metrics::histogram!("host_tree_build_seconds").record(elapsed.as_secs_f64());
        tracing::info!(
            groups = tree.len(),
            hosts = paging.total,
            page = paging.page,
            limit_exceeded = limit_exceeded,
            elapsed_ms = elapsed.as_millis(),
            "Host tree assembled"
        );

        Ok(HostTreeView {
            roots: tree.roots(),
            groups: tree,
            hosts,
            paging,
            view_url: url.view(),
            filter: filter.clone(),
            groups_multiselect,
            generated_at: Utc::now(),
        })
    }

    /// 展开或折叠一个组，返回新的展开列表
    pub async fn toggle(
        &self,
        filter: &Filter,
        defaults: &Filter,
        group_id: GroupId,
        collapse: bool,
    ) -> Result<ToggleResult, AppError> {
        let tree = self.load_tree(filter).await?;
        let expanded = visibility::toggle(&tree, &filter.expanded_groups, group_id, collapse);

        tracing::debug!(
            group = %group_id,
            collapse = collapse,
            expanded = expanded.len(),
            "Group visibility toggled"
        );

        let next = Filter {
            expanded_groups: expanded,
            ..filter.clone()
        };
        let url = PageUrl::for_filter(self.view.base_url.as_str(), &next, defaults);

        Ok(ToggleResult {
            expanded_groups_param: next.expanded_groups_param(),
            expanded_groups: next.expanded_groups,
            view_url: url.view(),
        })
    }

    /// 构建组树（不含问题数与主机）
    pub async fn load_tree(&self, filter: &Filter) -> Result<GroupTree, AppError> {
        let flat = self.flat_groups(filter).await?;
        Ok(GroupTreeBuilder::new(filter.sortorder).build(&flat, &filter.expanded_groups))
    }

    fn paginator(&self) -> Paginator {
        Paginator::new(self.view.rows_per_page, self.view.search_limit, self.view.page_window)
    }

    /// 含监控中主机的组，附带直属主机数
    async fn flat_groups(&self, filter: &Filter) -> Result<Vec<FlatGroup>, ApiError> {
        let groupids = if filter.groupids.is_empty() {
            None
        } else {
            Some(self.with_subgroups(&filter.groupids).await?)
        };

        let records = self
            .api
            .host_groups(&HostGroupQuery {
                groupids,
                with_monitored_hosts: true,
            })
            .await?;

        let mut flat = Vec::with_capacity(records.len());
        for record in records {
            let count = self.api.count_hosts(record.groupid).await?;
            flat.push(FlatGroup::new(record.groupid, record.name, count));
        }
        Ok(flat)
    }

    /// 选中的组及其所有子组（按名字前缀）
    async fn with_subgroups(&self, groupids: &[u64]) -> Result<Vec<u64>, ApiError> {
        let selected = self
            .api
            .host_groups(&HostGroupQuery {
                groupids: Some(groupids.to_vec()),
                with_monitored_hosts: false,
            })
            .await?;
        let prefixes: Vec<String> = selected
            .iter()
            .map(|g| format!("{}{}", g.name, path::SEPARATOR))
            .collect();

        let mut ids: BTreeSet<u64> = groupids.iter().copied().collect();
        if !prefixes.is_empty() {
            let all = self.api.host_groups(&HostGroupQuery::default()).await?;
            ids.extend(
                all.iter()
                    .filter(|g| prefixes.iter().any(|prefix| g.name.starts_with(prefix)))
                    .map(|g| g.groupid),
            );
        }

        Ok(ids.into_iter().collect())
    }

    async fn selected_groups(&self, groupids: &[u64]) -> Result<Vec<SelectedGroup>, ApiError> {
        if groupids.is_empty() {
            return Ok(Vec::new());
        }
        let records = self
            .api
            .host_groups(&HostGroupQuery {
                groupids: Some(groupids.to_vec()),
                with_monitored_hosts: false,
            })
            .await?;
        Ok(records
            .into_iter()
            .map(|g| SelectedGroup {
                id: g.groupid,
                name: g.name,
            })
            .collect())
    }
}
