//! 监控平台数据访问层
//!
//! 组、主机、触发器、问题、监控项与仪表盘都存储在远端平台中，
//! 这里只定义查询接口；生产实现见 [`zabbix_api`]。

pub mod zabbix_api;

pub use zabbix_api::ZabbixApi;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::models::{Filter, HostStatus, Interface, Severity, Tag, TagEvalType, TagFilter};

/// 远端 API 错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {method}")]
    Status { method: String, status: u16 },

    #[error("API error {code} in {method}: {message} {data}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
        data: String,
    },

    #[error("Malformed response from {method}: {message}")]
    Malformed { method: String, message: String },
}

/// 组查询
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostGroupQuery {
    /// None 表示所有组
    pub groupids: Option<Vec<u64>>,
    /// 只返回至少包含一台监控中主机的组
    pub with_monitored_hosts: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostGroupRecord {
    pub groupid: u64,
    pub name: String,
}

/// 主机查询
#[derive(Debug, Clone, PartialEq)]
pub struct HostQuery {
    pub groupids: Vec<u64>,
    pub name: Option<String>,
    pub ip: Option<String>,
    pub dns: Option<String>,
    pub port: Option<String>,
    pub status: Option<HostStatus>,
    pub evaltype: TagEvalType,
    pub tags: Vec<TagFilter>,
    /// 只返回存在这些级别问题的主机
    pub severities: Option<Vec<Severity>>,
    /// Some(false) 时忽略被抑制的问题
    pub with_problems_suppressed: Option<bool>,
    /// false 时只返回不在维护期的主机
    pub include_maintenance: bool,
    pub limit: Option<usize>,
    /// 是否选取接口、标签、图形与 Web 场景数
    pub with_details: bool,
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl HostQuery {
    /// 组内直属主机（用于计算组问题数，不按严重级别过滤）
    pub fn members_of(groupid: u64, filter: &Filter) -> Self {
        Self {
            groupids: vec![groupid],
            name: non_empty(&filter.name),
            ip: non_empty(&filter.ip),
            dns: non_empty(&filter.dns),
            port: non_empty(&filter.port),
            status: filter.status,
            evaltype: filter.evaltype,
            tags: filter.tags.clone(),
            severities: None,
            with_problems_suppressed: None,
            include_maintenance: filter.include_maintenance,
            limit: None,
            with_details: false,
        }
    }

    /// 组内待展示的主机
    pub fn listing(groupid: u64, filter: &Filter, limit: usize) -> Self {
        let severities = if filter.severities.is_empty() {
            None
        } else {
            Some(filter.severities.clone())
        };
        let with_problems_suppressed = match (&severities, filter.show_suppressed) {
            (Some(_), false) => Some(false),
            _ => None,
        };

        Self {
            severities,
            with_problems_suppressed,
            limit: Some(limit),
            with_details: true,
            ..Self::members_of(groupid, filter)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostRecord {
    pub hostid: u64,
    pub name: String,
    pub status: Option<HostStatus>,
    pub interfaces: Vec<Interface>,
    pub tags: Vec<Tag>,
    pub inherited_tags: Vec<Tag>,
    pub graphs: u64,
    pub http_tests: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRecord {
    pub triggerid: u64,
    pub hostids: Vec<u64>,
}

/// 未解决问题查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemQuery {
    pub objectids: Vec<u64>,
    /// Some(false) 时排除被抑制的问题；None 时不限
    pub suppressed: Option<bool>,
}

impl ProblemQuery {
    pub fn for_triggers(objectids: Vec<u64>, show_suppressed: bool) -> Self {
        Self {
            objectids,
            suppressed: if show_suppressed { None } else { Some(false) },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemRecord {
    pub eventid: u64,
    pub objectid: u64,
    pub severity: Severity,
}

/// 监控平台查询接口
///
/// 每个方法对应一次远端调用；结果视为时间点快照，调用之间不保证一致。
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    async fn host_groups(&self, query: &HostGroupQuery) -> Result<Vec<HostGroupRecord>, ApiError>;

    /// 组内主机总数（不加过滤条件）
    async fn count_hosts(&self, groupid: u64) -> Result<u64, ApiError>;

    async fn hosts(&self, query: &HostQuery) -> Result<Vec<HostRecord>, ApiError>;

    /// 监控中主机上的触发器，跳过依赖触发器
    async fn triggers(&self, hostids: &[u64]) -> Result<Vec<TriggerRecord>, ApiError>;

    async fn problems(&self, query: &ProblemQuery) -> Result<Vec<ProblemRecord>, ApiError>;

    /// 每台主机的监控中监控项数（含 Web 监控项）
    async fn item_counts(&self, hostids: &[u64]) -> Result<HashMap<u64, u64>, ApiError>;

    /// 主机继承的全部模板（含嵌套模板）
    async fn parent_templates(&self, hostid: u64) -> Result<Vec<u64>, ApiError>;

    async fn template_dashboard_count(&self, templateids: &[u64]) -> Result<u64, ApiError>;
}
