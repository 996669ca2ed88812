//! 可见组的主机收集

use serde::{ser::SerializeMap, Serialize, Serializer};
use std::collections::{HashMap, HashSet};

use super::{natural::natural_cmp, GroupTree};
use crate::models::{merge_tags, Filter, Host, HostStatus, SeverityCounts, SortField};
use crate::repository::{ApiError, HostQuery, HostRecord, MonitoringApi, ProblemQuery};

/// 按插入顺序保存的主机集合，以主机 ID 去重
///
/// 重复插入时属性以后来者为准，所属组名累加，位置保持首次出现的位置。
#[derive(Debug, Clone, Default)]
pub struct HostMap {
    order: Vec<u64>,
    hosts: HashMap<u64, Host>,
}

impl HostMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, host: Host) {
        match self.hosts.get_mut(&host.id) {
            Some(existing) => {
                let mut group_names = std::mem::take(&mut existing.group_names);
                for name in &host.group_names {
                    if !group_names.contains(name) {
                        group_names.push(name.clone());
                    }
                }
                *existing = Host { group_names, ..host };
            }
            None => {
                self.order.push(host.id);
                self.hosts.insert(host.id, host);
            }
        }
    }

    pub fn extend(&mut self, other: HostMap) {
        for host in other.into_hosts() {
            self.insert(host);
        }
    }

    pub fn get(&self, id: u64) -> Option<&Host> {
        self.hosts.get(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[u64] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Host> {
        self.order.iter().filter_map(|id| self.hosts.get(id))
    }

    /// 截取 `[offset, offset + len)`，越界部分忽略
    pub fn slice(&self, offset: usize, len: usize) -> HostMap {
        let mut page = HostMap::new();
        for host in self.iter().skip(offset).take(len) {
            page.insert(host.clone());
        }
        page
    }

    /// 只保留前 `len` 台主机
    pub fn truncate(&mut self, len: usize) {
        for id in self.order.drain(len.min(self.order.len())..) {
            self.hosts.remove(&id);
        }
    }

    pub fn into_hosts(mut self) -> Vec<Host> {
        self.order
            .iter()
            .filter_map(|id| self.hosts.remove(id))
            .collect()
    }
}

impl FromIterator<Host> for HostMap {
    fn from_iter<I: IntoIterator<Item = Host>>(iter: I) -> Self {
        let mut map = HostMap::new();
        for host in iter {
            map.insert(host);
        }
        map
    }
}

impl Serialize for HostMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for host in self.iter() {
            map.serialize_entry(&host.id.to_string(), host)?;
        }
        map.end()
    }
}

pub struct HostCollector<'a> {
    api: &'a dyn MonitoringApi,
    search_limit: usize,
}

impl<'a> HostCollector<'a> {
    pub fn new(api: &'a dyn MonitoringApi, search_limit: usize) -> Self {
        Self { api, search_limit }
    }

    /// 收集某个组下应展示的主机
    ///
    /// 组有展开的子组时，只返回第一个展开子组（逐层向下）的结果；
    /// 否则取该组自身的直属主机，并把主机 ID 写回组节点的 `hosts`。
    pub async fn collect(
        &self,
        tree: &mut GroupTree,
        name: &str,
        filter: &Filter,
    ) -> Result<HostMap, ApiError> {
        let Some(target) = Self::resolve_target(tree, name) else {
            return Ok(HostMap::new());
        };
        let Some(groupid) = tree.get(&target).and_then(|group| group.id.real()) else {
            // 占位组没有自己的主机
            return Ok(HostMap::new());
        };

        let limit = self.search_limit.saturating_add(1);
        let mut records = self.api.hosts(&HostQuery::listing(groupid, filter, limit)).await?;
        sort_records(&mut records, filter);

        let hosts = self.enrich(records, &target, filter).await?;

        if let Some(group) = tree.get_mut(&target) {
            group.hosts = hosts.ids().to_vec();
        }

        tracing::debug!(group = %target, hosts = hosts.len(), "Hosts collected");
        Ok(hosts)
    }

    /// 沿第一个存在且展开的子组下降，直到没有这样的子组
    fn resolve_target(tree: &GroupTree, name: &str) -> Option<String> {
        let mut current = tree.get(name)?;
        loop {
            let next = current
                .children
                .iter()
                .filter_map(|child| tree.get(child))
                .find(|child| !child.is_collapsed);
            match next {
                Some(child) => current = child,
                None => return Some(current.name.clone()),
            }
        }
    }

    async fn enrich(
        &self,
        records: Vec<HostRecord>,
        group_name: &str,
        filter: &Filter,
    ) -> Result<HostMap, ApiError> {
        if records.is_empty() {
            return Ok(HostMap::new());
        }
        let hostids: Vec<u64> = records.iter().map(|r| r.hostid).collect();

        let problem_counts = self.problem_counts(&hostids, filter).await?;
        let item_counts = self.api.item_counts(&hostids).await?;

        let mut hosts = HostMap::new();
        for record in records {
            let templates = self.api.parent_templates(record.hostid).await?;
            let dashboards = if templates.is_empty() {
                0
            } else {
                self.api.template_dashboard_count(&templates).await?
            };

            hosts.insert(Host {
                id: record.hostid,
                name: record.name,
                status: record.status.unwrap_or(HostStatus::Enabled),
                interfaces: record.interfaces,
                problem_count: problem_counts.get(&record.hostid).copied().unwrap_or_default(),
                tags: merge_tags(&record.tags, &record.inherited_tags),
                items_count: item_counts.get(&record.hostid).copied().unwrap_or(0),
                graphs: record.graphs,
                dashboards,
                http_tests: record.http_tests,
                group_names: vec![group_name.to_string()],
            });
        }

        Ok(hosts)
    }

    /// 每台主机的问题数，同一事件只计一次
    async fn problem_counts(
        &self,
        hostids: &[u64],
        filter: &Filter,
    ) -> Result<HashMap<u64, SeverityCounts>, ApiError> {
        let triggers = self.api.triggers(hostids).await?;
        if triggers.is_empty() {
            return Ok(HashMap::new());
        }

        let wanted: HashSet<u64> = hostids.iter().copied().collect();
        let mut trigger_hosts: HashMap<u64, Vec<u64>> = HashMap::new();
        for trigger in triggers {
            let hosts = trigger_hosts.entry(trigger.triggerid).or_default();
            hosts.extend(trigger.hostids.into_iter().filter(|id| wanted.contains(id)));
        }

        let triggerids: Vec<u64> = trigger_hosts.keys().copied().collect();
        let problems = self
            .api
            .problems(&ProblemQuery::for_triggers(triggerids, filter.show_suppressed))
            .await?;

        let mut seen: HashSet<(u64, u64)> = HashSet::new();
        let mut counts: HashMap<u64, SeverityCounts> = HashMap::new();
        for problem in problems {
            let Some(hosts) = trigger_hosts.get(&problem.objectid) else {
                continue;
            };
            for hostid in hosts {
                if seen.insert((*hostid, problem.eventid)) {
                    counts.entry(*hostid).or_default().increment(problem.severity);
                }
            }
        }

        Ok(counts)
    }
}

/// 按名字（自然顺序）或状态排序
fn sort_records(records: &mut [HostRecord], filter: &Filter) {
    let order = filter.sortorder;
    match filter.sort {
        SortField::Name => records.sort_by(|a, b| order.apply(natural_cmp(&a.name, &b.name))),
        SortField::Status => records.sort_by(|a, b| {
            let status = |r: &HostRecord| r.status.map(HostStatus::code).unwrap_or(0);
            order.apply(
                status(a)
                    .cmp(&status(b))
                    .then_with(|| natural_cmp(&a.name, &b.name)),
            )
        }),
    }
}
