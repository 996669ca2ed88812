//! 问题严重级别与按级别计数

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::AddAssign;

/// 触发器严重级别（从低到高）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Severity {
    NotClassified = 0,
    Information = 1,
    Warning = 2,
    Average = 3,
    High = 4,
    Disaster = 5,
}

impl Severity {
    /// 级别数量
    pub const COUNT: usize = 6;

    /// 所有级别，从低到高
    pub const ALL: [Severity; Self::COUNT] = [
        Severity::NotClassified,
        Severity::Information,
        Severity::Warning,
        Severity::Average,
        Severity::High,
        Severity::Disaster,
    ];

    /// 从高到低迭代（渲染顺序：disaster → not classified）
    pub fn descending() -> impl Iterator<Item = Severity> {
        Self::ALL.into_iter().rev()
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(level as usize).copied()
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Severity::NotClassified => "Not classified",
            Severity::Information => "Information",
            Severity::Warning => "Warning",
            Severity::Average => "Average",
            Severity::High => "High",
            Severity::Disaster => "Disaster",
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::from_level(level).ok_or_else(|| format!("unknown severity level: {}", level))
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.level()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 每个严重级别一个计数，初始全为 0
///
/// 序列化为 `{"5": n, "4": n, ...}`，按从高到低的顺序输出。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts([u64; Severity::COUNT]);

impl SeverityCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, severity: Severity) -> u64 {
        self.0[severity as usize]
    }

    pub fn increment(&mut self, severity: Severity) {
        self.0[severity as usize] += 1;
    }

    pub fn add(&mut self, severity: Severity, count: u64) {
        self.0[severity as usize] += count;
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    /// 从高到低迭代 (severity, count)
    pub fn iter_descending(&self) -> impl Iterator<Item = (Severity, u64)> + '_ {
        Severity::descending().map(move |s| (s, self.get(s)))
    }
}

impl AddAssign<&SeverityCounts> for SeverityCounts {
    fn add_assign(&mut self, other: &SeverityCounts) {
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            *mine += theirs;
        }
    }
}

impl Serialize for SeverityCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Severity::COUNT))?;
        for (severity, count) in self.iter_descending() {
            map.serialize_entry(&severity.level().to_string(), &count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descending_order() {
        let order: Vec<u8> = Severity::descending().map(Severity::level).collect();
        assert_eq!(order, vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_counts_add_assign() {
        let mut a = SeverityCounts::new();
        a.increment(Severity::Disaster);
        let mut b = SeverityCounts::new();
        b.add(Severity::Disaster, 2);
        b.increment(Severity::Warning);

        a += &b;
        assert_eq!(a.get(Severity::Disaster), 3);
        assert_eq!(a.get(Severity::Warning), 1);
        assert_eq!(a.total(), 4);
    }

    #[test]
    fn test_counts_serialize_high_to_low() {
        let mut counts = SeverityCounts::new();
        counts.increment(Severity::High);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"5":0,"4":1,"3":0,"2":0,"1":0,"0":0}"#);
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(Severity::try_from(6).is_err());
        assert_eq!(Severity::try_from(3).unwrap(), Severity::Average);
    }
}
