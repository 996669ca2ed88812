//! 问题数汇总
//!
//! 先取每个组直属主机上的未解决问题数，再自底向上累加到父组。

use std::collections::{BTreeMap, HashMap};

use super::{path, GroupTree};
use crate::models::{Filter, GroupId, SeverityCounts};
use crate::repository::{ApiError, HostQuery, MonitoringApi, ProblemQuery};

pub struct ProblemAggregator<'a> {
    api: &'a dyn MonitoringApi,
}

impl<'a> ProblemAggregator<'a> {
    pub fn new(api: &'a dyn MonitoringApi) -> Self {
        Self { api }
    }

    /// 每个组直属主机的问题数
    ///
    /// 占位组与没有直属主机的组不发起查询。
    pub async fn direct_counts(
        &self,
        tree: &GroupTree,
        filter: &Filter,
    ) -> Result<HashMap<GroupId, SeverityCounts>, ApiError> {
        let mut direct = HashMap::new();

        for (name, group) in tree.iter() {
            let Some(groupid) = group.id.real() else {
                continue;
            };
            if group.direct_hosts == 0 {
                continue;
            }

            let hosts = self.api.hosts(&HostQuery::members_of(groupid, filter)).await?;
            if hosts.is_empty() {
                continue;
            }
            let hostids: Vec<u64> = hosts.iter().map(|h| h.hostid).collect();

            let triggers = self.api.triggers(&hostids).await?;
            if triggers.is_empty() {
                continue;
            }
            let triggerids: Vec<u64> = triggers.iter().map(|t| t.triggerid).collect();

            let problems = self
                .api
                .problems(&ProblemQuery::for_triggers(triggerids, filter.show_suppressed))
                .await?;

            let mut counts = SeverityCounts::new();
            for problem in &problems {
                counts.increment(problem.severity);
            }

            tracing::trace!(group = %name, problems = counts.total(), "Direct problem counts");
            direct.insert(group.id, counts);
        }

        Ok(direct)
    }

    /// 写入直属计数并自底向上累加
    ///
    /// 每次都先用 `direct` 覆盖，因此重复调用结果不变。
    pub fn aggregate(tree: &mut GroupTree, direct: &HashMap<GroupId, SeverityCounts>) {
        let mut by_depth: BTreeMap<usize, Vec<String>> = BTreeMap::new();

        for (name, group) in tree.iter_mut() {
            group.problem_count = direct.get(&group.id).copied().unwrap_or_default();
            by_depth.entry(path::depth(name)).or_default().push(name.clone());
        }

        // 最深的一层先结算，父组累加时子组已是最终值
        for names in by_depth.values().rev() {
            for name in names {
                let Some(group) = tree.get(name) else {
                    continue;
                };

                let mut rolled = group.problem_count;
                for child in &group.children {
                    if let Some(child) = tree.get(child) {
                        rolled += &child.problem_count;
                    }
                }

                if let Some(group) = tree.get_mut(name) {
                    group.problem_count = rolled;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlatGroup, Severity, SortOrder};
    use crate::tree::GroupTreeBuilder;

    fn counts(pairs: &[(Severity, u64)]) -> SeverityCounts {
        let mut counts = SeverityCounts::new();
        for (severity, n) in pairs {
            counts.add(*severity, *n);
        }
        counts
    }

    fn three_levels() -> GroupTree {
        GroupTreeBuilder::new(SortOrder::Asc).build(
            &[
                FlatGroup::new(1, "a", 1),
                FlatGroup::new(2, "a/b", 1),
                FlatGroup::new(3, "a/b/c", 1),
            ],
            &[],
        )
    }

    #[test]
    fn test_three_level_roll_up() {
        let mut tree = three_levels();
        let direct = HashMap::from([
            (GroupId::Real(3), counts(&[(Severity::Disaster, 2)])),
            (GroupId::Real(2), counts(&[(Severity::High, 1)])),
        ]);

        ProblemAggregator::aggregate(&mut tree, &direct);

        let a = tree.get("a").unwrap().problem_count;
        assert_eq!(a.get(Severity::Disaster), 2);
        assert_eq!(a.get(Severity::High), 1);

        let b = tree.get("a/b").unwrap().problem_count;
        assert_eq!(b.get(Severity::Disaster), 2);
        assert_eq!(b.get(Severity::High), 1);

        let c = tree.get("a/b/c").unwrap().problem_count;
        assert_eq!(c.get(Severity::Disaster), 2);
        assert_eq!(c.get(Severity::High), 0);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let mut tree = three_levels();
        let direct = HashMap::from([(GroupId::Real(3), counts(&[(Severity::Warning, 4)]))]);

        ProblemAggregator::aggregate(&mut tree, &direct);
        ProblemAggregator::aggregate(&mut tree, &direct);

        assert_eq!(tree.get("a").unwrap().problem_count.get(Severity::Warning), 4);
        assert_eq!(tree.get("a/b").unwrap().problem_count.get(Severity::Warning), 4);
    }

    #[test]
    fn test_missing_child_is_skipped() {
        let mut tree = three_levels();
        tree.get_mut("a").unwrap().children.push("a/ghost".to_string());
        let direct = HashMap::from([(GroupId::Real(1), counts(&[(Severity::Average, 1)]))]);

        ProblemAggregator::aggregate(&mut tree, &direct);
        assert_eq!(tree.get("a").unwrap().problem_count.total(), 1);
    }

    #[test]
    fn test_collapsed_groups_still_counted() {
        // 全部折叠
        let mut tree = three_levels();
        assert!(tree.iter().all(|(_, g)| g.is_collapsed));
        let direct = HashMap::from([(GroupId::Real(3), counts(&[(Severity::Information, 1)]))]);

        ProblemAggregator::aggregate(&mut tree, &direct);
        assert_eq!(tree.get("a").unwrap().problem_count.get(Severity::Information), 1);
    }

    #[test]
    fn test_placeholder_parent_accumulates() {
        let mut tree =
            GroupTreeBuilder::new(SortOrder::Asc).build(&[FlatGroup::new(10, "x/y", 3)], &[]);
        let direct = HashMap::from([(GroupId::Real(10), counts(&[(Severity::High, 3)]))]);

        ProblemAggregator::aggregate(&mut tree, &direct);
        assert_eq!(tree.get("x").unwrap().problem_count.get(Severity::High), 3);
    }
}
