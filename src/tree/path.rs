//! 组名路径解析
//!
//! 组名以 `/` 分隔层级，例如 `dc1/rack2/db`。

pub const SEPARATOR: char = '/';

/// 层级深度：分隔符的个数
pub fn depth(name: &str) -> usize {
    name.matches(SEPARATOR).count()
}

/// 父组名（去掉最后一段），根组返回 None
///
/// 以分隔符开头的名字（`/x`）没有空名父组，视为根。
pub fn parent(name: &str) -> Option<&str> {
    name.rfind(SEPARATOR)
        .map(|index| &name[..index])
        .filter(|prefix| !prefix.is_empty())
}

/// 所有祖先前缀，从最近的父组到最远的根
pub fn ancestors(name: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(parent(name), |current| parent(*current))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth() {
        assert_eq!(depth("a"), 0);
        assert_eq!(depth("a/b/c"), 2);
        assert_eq!(depth("/level0/level1"), 2);
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("a/b/c"), Some("a/b"));
        assert_eq!(parent("a"), None);
    }

    #[test]
    fn test_ancestors_shortest_last() {
        let found: Vec<&str> = ancestors("a/b/c/d").collect();
        assert_eq!(found, vec!["a/b/c", "a/b", "a"]);
        assert_eq!(ancestors("root").count(), 0);
    }

    #[test]
    fn test_leading_separator_is_not_an_empty_root() {
        let found: Vec<&str> = ancestors("/x/y").collect();
        assert_eq!(found, vec!["/x"]);
        assert_eq!(parent("/x"), None);
    }
}
