//! Host domain models

use serde::{Deserialize, Serialize};

use super::severity::SeverityCounts;

/// 主机状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Enabled,
    Disabled,
}

impl HostStatus {
    /// 平台状态码：0 = 监控中，1 = 未监控
    pub fn from_code(code: u8) -> Self {
        if code == 0 {
            HostStatus::Enabled
        } else {
            HostStatus::Disabled
        }
    }

    pub fn code(self) -> u8 {
        match self {
            HostStatus::Enabled => 0,
            HostStatus::Disabled => 1,
        }
    }
}

/// 主机标签
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub tag: String,
    #[serde(default)]
    pub value: String,
}

impl Tag {
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

/// 主机网络接口
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub dns: String,
    #[serde(default)]
    pub port: String,
    /// 1 = 该类型的默认接口
    #[serde(default)]
    pub main: u8,
    /// 1 agent, 2 SNMP, 3 IPMI, 4 JMX
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub useip: u8,
    #[serde(default)]
    pub available: u8,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// 展示用主机记录
#[derive(Debug, Clone, Serialize)]
pub struct Host {
    #[serde(rename = "hostid")]
    pub id: u64,
    pub name: String,
    pub status: HostStatus,
    pub interfaces: Vec<Interface>,
    pub problem_count: SeverityCounts,
    pub tags: Vec<Tag>,
    pub items_count: u64,
    pub graphs: u64,
    pub dashboards: u64,
    #[serde(rename = "httpTests")]
    pub http_tests: u64,
    /// 主机被取到时所在的所有可见组
    pub group_names: Vec<String>,
}

/// 合并主机标签与继承的模板标签
///
/// 主机自身标签在前；模板标签仅当不存在完全相同的 (tag, value) 时追加。
pub fn merge_tags(host_tags: &[Tag], inherited_tags: &[Tag]) -> Vec<Tag> {
    let mut tags = host_tags.to_vec();
    for template_tag in inherited_tags {
        if !tags.contains(template_tag) {
            tags.push(template_tag.clone());
        }
    }
    tags
}
