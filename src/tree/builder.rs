//! 由扁平组列表构建组树
//!
//! 平台只存储扁平的组名，层级关系完全由 `/` 分隔的名字隐含。
//! 某一层祖先可能没有对应的真实组（或该组没有符合条件的主机），
//! 这时插入占位节点，保证树中没有断链。

use std::collections::{BTreeMap, HashMap};

use super::{natural::natural_cmp, path, GroupTree};
use crate::models::{FlatGroup, Group, GroupId, SortOrder, SYNTHETIC_GROUP_ID_START};

pub struct GroupTreeBuilder {
    order: SortOrder,
    next_synthetic: u64,
}

impl GroupTreeBuilder {
    pub fn new(order: SortOrder) -> Self {
        Self {
            order,
            next_synthetic: SYNTHETIC_GROUP_ID_START,
        }
    }

    /// 构建包含全部祖先的组树，并完成主机数汇总
    pub fn build(mut self, flat_groups: &[FlatGroup], expanded: &[GroupId]) -> GroupTree {
        let known: HashMap<&str, u64> = flat_groups
            .iter()
            .map(|group| (group.name.as_str(), group.id))
            .collect();

        // 按名字升序处理：父组名总是子组名的前缀，因此先于子组出现
        let mut ordered: Vec<&FlatGroup> = flat_groups.iter().collect();
        ordered.sort_by(|a, b| a.name.cmp(&b.name));

        let mut groups: BTreeMap<String, Group> = BTreeMap::new();

        for flat in ordered {
            if let Some(existing) = groups.get_mut(&flat.name) {
                // 已作为祖先被创建过
                existing.direct_hosts = flat.direct_host_count;
                continue;
            }

            let id = GroupId::Real(flat.id);
            groups.insert(
                flat.name.clone(),
                Group::new(id, flat.name.clone(), flat.direct_host_count, !expanded.contains(&id)),
            );
            self.link_ancestors(&mut groups, &known, &flat.name, expanded);
        }

        for group in groups.values_mut() {
            let order = self.order;
            group.children.sort_by(|a, b| order.apply(natural_cmp(a, b)));
        }

        let mut tree = GroupTree::new(groups, self.order);
        tree.roll_up_host_counts();

        tracing::debug!(
            groups = tree.len(),
            placeholders = self.next_synthetic - SYNTHETIC_GROUP_ID_START,
            "Group tree built"
        );

        tree
    }

    /// 自下而上补齐祖先，遇到已存在的父组即停止
    fn link_ancestors(
        &mut self,
        groups: &mut BTreeMap<String, Group>,
        known: &HashMap<&str, u64>,
        name: &str,
        expanded: &[GroupId],
    ) {
        let mut current = name.to_string();

        while let Some(parent_name) = path::parent(&current).map(str::to_string) {
            if let Some(group) = groups.get_mut(&current) {
                group.parent_group_name = parent_name.clone();
            }

            if let Some(parent) = groups.get_mut(&parent_name) {
                if !parent.children.contains(&current) {
                    parent.children.push(current);
                }
                return;
            }

            let id = match known.get(parent_name.as_str()) {
                Some(real) => GroupId::Real(*real),
                None => self.next_synthetic_id(),
            };
            let mut placeholder = Group::new(id, parent_name.clone(), 0, !expanded.contains(&id));
            placeholder.children.push(current);
            groups.insert(parent_name.clone(), placeholder);

            current = parent_name;
        }
    }

    fn next_synthetic_id(&mut self) -> GroupId {
        let id = GroupId::Synthetic(self.next_synthetic);
        self.next_synthetic += 1;
        id
    }
}
