//! 展开 / 折叠切换
//!
//! 手风琴式：展开一个组时折叠它的兄弟组；展开根组时折叠其他所有根组。

use super::GroupTree;
use crate::models::GroupId;

/// 计算切换后的展开组列表
///
/// 未知的组 ID 原样加入或移除，不做兄弟折叠。
pub fn toggle(tree: &GroupTree, expanded: &[GroupId], group_id: GroupId, collapse: bool) -> Vec<GroupId> {
    let mut next: Vec<GroupId> = expanded.iter().copied().filter(|id| *id != group_id).collect();
    if collapse {
        return next;
    }

    if let Some(group) = tree.find_by_id(group_id) {
        let siblings: Vec<GroupId> = if group.is_root() {
            tree.roots()
                .iter()
                .filter_map(|name| tree.get(name))
                .map(|g| g.id)
                .collect()
        } else {
            tree.get(&group.parent_group_name)
                .map(|parent| {
                    parent
                        .children
                        .iter()
                        .filter_map(|name| tree.get(name))
                        .map(|g| g.id)
                        .collect()
                })
                .unwrap_or_default()
        };
        next.retain(|id| !siblings.contains(id));
    }

    next.push(group_id);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlatGroup, SortOrder};
    use crate::tree::GroupTreeBuilder;

    fn tree() -> GroupTree {
        GroupTreeBuilder::new(SortOrder::Asc).build(
            &[
                FlatGroup::new(1, "a", 1),
                FlatGroup::new(2, "a/b", 1),
                FlatGroup::new(3, "a/c", 1),
                FlatGroup::new(4, "d", 1),
                FlatGroup::new(5, "a/b/x", 1),
            ],
            &[],
        )
    }

    #[test]
    fn test_expanding_collapses_siblings() {
        let expanded = vec![GroupId::Real(1), GroupId::Real(2), GroupId::Real(5)];
        let next = toggle(&tree(), &expanded, GroupId::Real(3), false);
        // a/b 被折叠；a/b/x 保留，但 a/b 折叠后不可见
        assert_eq!(next, vec![GroupId::Real(1), GroupId::Real(5), GroupId::Real(3)]);
    }

    #[test]
    fn test_expanding_root_collapses_other_roots() {
        let expanded = vec![GroupId::Real(1), GroupId::Real(2)];
        let next = toggle(&tree(), &expanded, GroupId::Real(4), false);
        assert_eq!(next, vec![GroupId::Real(2), GroupId::Real(4)]);
    }

    #[test]
    fn test_collapse_removes_only_target() {
        let expanded = vec![GroupId::Real(1), GroupId::Real(2)];
        let next = toggle(&tree(), &expanded, GroupId::Real(1), true);
        assert_eq!(next, vec![GroupId::Real(2)]);
    }

    #[test]
    fn test_expand_is_not_duplicated() {
        let expanded = vec![GroupId::Real(4)];
        let next = toggle(&tree(), &expanded, GroupId::Real(4), false);
        assert_eq!(next, vec![GroupId::Real(4)]);
    }

    #[test]
    fn test_unknown_group() {
        let next = toggle(&tree(), &[GroupId::Real(1)], GroupId::Synthetic(100500), false);
        assert_eq!(next, vec![GroupId::Real(1), GroupId::Synthetic(100500)]);
    }
}
