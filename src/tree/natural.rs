//! 自然排序比较：数字段按数值比较，`host2` 排在 `host10` 之前

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

static CHUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+|\D+").expect("natural sort chunk pattern"));

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// 自然顺序比较两个名字（不区分大小写，完全相等时按原始字节序决胜）
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = CHUNK.find_iter(a).map(|m| m.as_str());
    let mut right = CHUNK.find_iter(b).map(|m| m.as_str());

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let x_digit = x.as_bytes()[0].is_ascii_digit();
                let y_digit = y.as_bytes()[0].is_ascii_digit();
                let ordering = if x_digit && y_digit {
                    compare_numeric(x, y)
                } else {
                    x.to_lowercase().cmp(&y.to_lowercase())
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}
