//! 测试公共模块
//! 提供测试配置与内存中的监控平台实现

#![allow(dead_code)]

use async_trait::async_trait;
use ops_hosttree::{
    config::{ApiConfig, AppConfig, LoggingConfig, ServerConfig, ViewConfig},
    middleware::AppState,
    models::{HostStatus, Severity, Tag},
    repository::{
        ApiError, HostGroupQuery, HostGroupRecord, HostQuery, HostRecord, MonitoringApi,
        ProblemQuery, ProblemRecord, TriggerRecord,
    },
};
use secrecy::Secret;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        api: ApiConfig {
            url: "http://127.0.0.1:9/api_jsonrpc.php".to_string(),
            token: Secret::new("test-token".to_string()),
            timeout_secs: 5,
        },
        view: ViewConfig {
            rows_per_page: 50,
            search_limit: 1000,
            base_url: "zabbix.php".to_string(),
            page_window: 11,
        },
    }
}

/// 创建测试应用状态
pub fn create_test_app_state(api: FakeMonitoringApi) -> Arc<AppState> {
    create_test_app_state_with(create_test_config(), api)
}

pub fn create_test_app_state_with(config: AppConfig, api: FakeMonitoringApi) -> Arc<AppState> {
    Arc::new(AppState::new(config, Arc::new(api)))
}

pub fn host(hostid: u64, name: &str) -> HostRecord {
    HostRecord {
        hostid,
        name: name.to_string(),
        status: Some(HostStatus::Enabled),
        tags: vec![Tag::new("env", "test")],
        graphs: 1,
        ..Default::default()
    }
}

/// 内存中的监控平台
#[derive(Default)]
pub struct FakeMonitoringApi {
    groups: Vec<HostGroupRecord>,
    members: HashMap<u64, Vec<HostRecord>>,
    triggers: Vec<TriggerRecord>,
    problems: Vec<ProblemRecord>,
    templates: HashMap<u64, Vec<u64>>,
    dashboards: HashMap<u64, u64>,
    next_id: u64,
    fail: bool,
    /// 发起过 host.get 的组
    pub host_queries: Mutex<Vec<u64>>,
}

impl FakeMonitoringApi {
    pub fn new() -> Self {
        Self {
            next_id: 1000,
            ..Default::default()
        }
    }

    /// 所有调用都返回错误
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_group(mut self, groupid: u64, name: &str, hosts: Vec<HostRecord>) -> Self {
        self.groups.push(HostGroupRecord {
            groupid,
            name: name.to_string(),
        });
        self.members.insert(groupid, hosts);
        self
    }

    /// 在主机上新建一个触发器及其未解决问题
    pub fn with_problem(mut self, hostid: u64, severity: Severity) -> Self {
        self.next_id += 1;
        let id = self.next_id;
        self.triggers.push(TriggerRecord {
            triggerid: id,
            hostids: vec![hostid],
        });
        self.problems.push(ProblemRecord {
            eventid: id,
            objectid: id,
            severity,
        });
        self
    }

    pub fn with_template(mut self, hostid: u64, templateid: u64, dashboards: u64) -> Self {
        self.templates.entry(hostid).or_default().push(templateid);
        self.dashboards.insert(templateid, dashboards);
        self
    }

    fn check(&self, method: &str) -> Result<(), ApiError> {
        if self.fail {
            return Err(ApiError::Status {
                method: method.to_string(),
                status: 503,
            });
        }
        Ok(())
    }

    fn host_has_severity(&self, hostid: u64, severities: &[Severity]) -> bool {
        self.problems.iter().any(|problem| {
            severities.contains(&problem.severity)
                && self
                    .triggers
                    .iter()
                    .any(|t| t.triggerid == problem.objectid && t.hostids.contains(&hostid))
        })
    }
}

#[async_trait]
impl MonitoringApi for FakeMonitoringApi {
    async fn host_groups(&self, query: &HostGroupQuery) -> Result<Vec<HostGroupRecord>, ApiError> {
        self.check("hostgroup.get")?;
        let mut groups: Vec<HostGroupRecord> = self
            .groups
            .iter()
            .filter(|g| query.groupids.as_ref().map_or(true, |ids| ids.contains(&g.groupid)))
            .filter(|g| {
                !query.with_monitored_hosts
                    || self.members.get(&g.groupid).is_some_and(|h| !h.is_empty())
            })
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn count_hosts(&self, groupid: u64) -> Result<u64, ApiError> {
        self.check("host.get")?;
        Ok(self.members.get(&groupid).map_or(0, |h| h.len() as u64))
    }

    async fn hosts(&self, query: &HostQuery) -> Result<Vec<HostRecord>, ApiError> {
        self.check("host.get")?;
        let mut found = Vec::new();
        for groupid in &query.groupids {
            if query.with_details {
                self.host_queries.lock().unwrap().push(*groupid);
            }
            for host in self.members.get(groupid).into_iter().flatten() {
                if let Some(name) = &query.name {
                    if !host.name.to_lowercase().contains(&name.to_lowercase()) {
                        continue;
                    }
                }
                if let Some(status) = query.status {
                    if host.status != Some(status) {
                        continue;
                    }
                }
                if let Some(severities) = &query.severities {
                    if !self.host_has_severity(host.hostid, severities) {
                        continue;
                    }
                }
                found.push(host.clone());
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn triggers(&self, hostids: &[u64]) -> Result<Vec<TriggerRecord>, ApiError> {
        self.check("trigger.get")?;
        Ok(self
            .triggers
            .iter()
            .filter(|t| t.hostids.iter().any(|id| hostids.contains(id)))
            .cloned()
            .collect())
    }

    async fn problems(&self, query: &ProblemQuery) -> Result<Vec<ProblemRecord>, ApiError> {
        self.check("problem.get")?;
        Ok(self
            .problems
            .iter()
            .filter(|p| query.objectids.contains(&p.objectid))
            .cloned()
            .collect())
    }

    async fn item_counts(&self, hostids: &[u64]) -> Result<HashMap<u64, u64>, ApiError> {
        self.check("item.get")?;
        Ok(hostids.iter().map(|id| (*id, 3)).collect())
    }

    async fn parent_templates(&self, hostid: u64) -> Result<Vec<u64>, ApiError> {
        self.check("template.get")?;
        Ok(self.templates.get(&hostid).cloned().unwrap_or_default())
    }

    async fn template_dashboard_count(&self, templateids: &[u64]) -> Result<u64, ApiError> {
        self.check("templatedashboard.get")?;
        Ok(templateids
            .iter()
            .map(|id| self.dashboards.get(id).copied().unwrap_or(0))
            .sum())
    }
}
