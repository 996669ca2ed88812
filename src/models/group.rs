//! Host group domain models

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::severity::SeverityCounts;

/// 合成（占位）组 ID 的起始值，位于真实 ID 空间之上
pub const SYNTHETIC_GROUP_ID_START: u64 = 100_000;

/// 组标识
///
/// 真实组使用平台分配的 ID；占位祖先组使用本地计数器生成的 ID。
/// 文本形式：真实组为十进制数字，占位组为 `p<计数>`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupId {
    Real(u64),
    Synthetic(u64),
}

impl GroupId {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, GroupId::Synthetic(_))
    }

    /// 平台侧 ID，占位组没有
    pub fn real(&self) -> Option<u64> {
        match self {
            GroupId::Real(id) => Some(*id),
            GroupId::Synthetic(_) => None,
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Real(id) => write!(f, "{}", id),
            GroupId::Synthetic(id) => write!(f, "p{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid group id: {0:?}")]
pub struct ParseGroupIdError(pub String);

impl FromStr for GroupId {
    type Err = ParseGroupIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix('p') {
            Some(rest) => rest.parse().map(GroupId::Synthetic),
            None => s.parse().map(GroupId::Real),
        };
        parsed.map_err(|_| ParseGroupIdError(s.to_string()))
    }
}

impl Serialize for GroupId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GroupId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// API 返回的扁平组记录（附带直属主机数）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatGroup {
    pub id: u64,
    pub name: String,
    pub direct_host_count: u64,
}

impl FlatGroup {
    pub fn new(id: u64, name: impl Into<String>, direct_host_count: u64) -> Self {
        Self {
            id,
            name: name.into(),
            direct_host_count,
        }
    }
}

/// 树中的一个组节点
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    #[serde(rename = "groupid")]
    pub id: GroupId,
    pub name: String,
    /// 仅属于本组的主机数
    pub direct_hosts: u64,
    /// 本组及所有后代组的主机数
    pub num_of_hosts: u64,
    pub children: Vec<String>,
    /// 父组全名，根组为空字符串
    pub parent_group_name: String,
    pub problem_count: SeverityCounts,
    pub is_collapsed: bool,
    /// 本页展示的直属主机 ID
    pub hosts: Vec<u64>,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>, direct_hosts: u64, is_collapsed: bool) -> Self {
        Self {
            id,
            name: name.into(),
            direct_hosts,
            num_of_hosts: direct_hosts,
            children: Vec::new(),
            parent_group_name: String::new(),
            problem_count: SeverityCounts::new(),
            is_collapsed,
            hosts: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_group_name.is_empty()
    }
}
