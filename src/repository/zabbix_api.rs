//! 监控平台 JSON-RPC 客户端
//!
//! 平台返回的 ID 与计数通常是字符串（`"10084"`），这里统一转换为整数。

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{
    ApiError, HostGroupQuery, HostGroupRecord, HostQuery, HostRecord, MonitoringApi,
    ProblemQuery, ProblemRecord, TriggerRecord,
};
use crate::config::ApiConfig;
use crate::models::{HostStatus, Interface, Severity, Tag};

/// 事件来源：触发器
const EVENT_SOURCE_TRIGGERS: u8 = 0;
/// 事件对象：触发器
const EVENT_OBJECT_TRIGGER: u8 = 0;
/// maintenance_status 过滤值：不在维护期
const HOST_MAINTENANCE_STATUS_OFF: u8 = 0;

pub struct ZabbixApi {
    client: Client,
    url: String,
    token: Secret<String>,
    next_id: AtomicU64,
}

impl ZabbixApi {
    pub fn new(client: Client, url: impl Into<String>, token: Secret<String>) -> Self {
        Self {
            client,
            url: url.into(),
            token,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("ops-hosttree/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(client, config.url.clone(), config.token.clone()))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ApiError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        tracing::debug!(method = %method, id = id, "Calling monitoring API");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method: method.to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: RpcResponse<T> = response.json().await.map_err(|e| ApiError::Malformed {
            method: method.to_string(),
            message: e.to_string(),
        })?;

        match (envelope.result, envelope.error) {
            (_, Some(error)) => Err(ApiError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
                data: error.data.unwrap_or_default(),
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(ApiError::Malformed {
                method: method.to_string(),
                message: "response has neither result nor error".to_string(),
            }),
        }
    }
}

#[async_trait]
impl MonitoringApi for ZabbixApi {
    async fn host_groups(&self, query: &HostGroupQuery) -> Result<Vec<HostGroupRecord>, ApiError> {
        let groups: Vec<WireGroup> = self.call("hostgroup.get", host_group_params(query)).await?;
        Ok(groups
            .into_iter()
            .map(|g| HostGroupRecord {
                groupid: g.groupid,
                name: g.name,
            })
            .collect())
    }

    async fn count_hosts(&self, groupid: u64) -> Result<u64, ApiError> {
        let count: Count = self
            .call(
                "host.get",
                json!({ "groupids": [groupid], "countOutput": true }),
            )
            .await?;
        Ok(count.0)
    }

    async fn hosts(&self, query: &HostQuery) -> Result<Vec<HostRecord>, ApiError> {
        let hosts: Vec<WireHost> = self.call("host.get", host_params(query)).await?;
        Ok(hosts.into_iter().map(WireHost::into_record).collect())
    }

    async fn triggers(&self, hostids: &[u64]) -> Result<Vec<TriggerRecord>, ApiError> {
        if hostids.is_empty() {
            return Ok(Vec::new());
        }
        let triggers: Vec<WireTrigger> = self
            .call(
                "trigger.get",
                json!({
                    "output": ["triggerid"],
                    "selectHosts": ["hostid"],
                    "hostids": hostids,
                    "skipDependent": true,
                    "monitored": true,
                }),
            )
            .await?;
        Ok(triggers
            .into_iter()
            .map(|t| TriggerRecord {
                triggerid: t.triggerid,
                hostids: t.hosts.into_iter().map(|h| h.hostid).collect(),
            })
            .collect())
    }

    async fn problems(&self, query: &ProblemQuery) -> Result<Vec<ProblemRecord>, ApiError> {
        if query.objectids.is_empty() {
            return Ok(Vec::new());
        }
        let problems: Vec<WireProblem> = self.call("problem.get", problem_params(query)).await?;

        let mut records = Vec::with_capacity(problems.len());
        for problem in problems {
            // 未知级别的问题不计入
            let Some(severity) = u8::try_from(problem.severity).ok().and_then(Severity::from_level)
            else {
                tracing::warn!(eventid = problem.eventid, severity = problem.severity, "Unknown problem severity");
                continue;
            };
            records.push(ProblemRecord {
                eventid: problem.eventid,
                objectid: problem.objectid,
                severity,
            });
        }
        Ok(records)
    }

    async fn item_counts(&self, hostids: &[u64]) -> Result<HashMap<u64, u64>, ApiError> {
        if hostids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<WireItemCount> = self
            .call(
                "item.get",
                json!({
                    "countOutput": true,
                    "groupCount": true,
                    "hostids": hostids,
                    "webitems": true,
                    "monitored": true,
                }),
            )
            .await?;
        Ok(rows.into_iter().map(|row| (row.hostid, row.rowscount)).collect())
    }

    async fn parent_templates(&self, hostid: u64) -> Result<Vec<u64>, ApiError> {
        let mut found: Vec<u64> = Vec::new();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut frontier = vec![hostid];

        // 模板可以再链接模板，逐层向上直到没有新模板
        while !frontier.is_empty() {
            let templates: Vec<WireTemplate> = self
                .call(
                    "template.get",
                    json!({ "output": ["templateid"], "hostids": frontier }),
                )
                .await?;

            frontier = templates
                .into_iter()
                .map(|t| t.templateid)
                .filter(|id| seen.insert(*id))
                .collect();
            found.extend(&frontier);
        }

        Ok(found)
    }

    async fn template_dashboard_count(&self, templateids: &[u64]) -> Result<u64, ApiError> {
        if templateids.is_empty() {
            return Ok(0);
        }
        let count: Count = self
            .call(
                "templatedashboard.get",
                json!({ "templateids": templateids, "countOutput": true }),
            )
            .await?;
        Ok(count.0)
    }
}

fn host_group_params(query: &HostGroupQuery) -> Value {
    let mut params = Map::new();
    params.insert("output".into(), json!(["groupid", "name"]));
    if let Some(ids) = &query.groupids {
        params.insert("groupids".into(), json!(ids));
    }
    if query.with_monitored_hosts {
        params.insert("with_monitored_hosts".into(), json!(true));
    }
    params.insert("sortfield".into(), json!("name"));
    Value::Object(params)
}

/// host.get 参数；空字段不下发
pub(crate) fn host_params(query: &HostQuery) -> Value {
    let mut params = Map::new();

    if query.with_details {
        params.insert("output".into(), json!(["hostid", "name", "status"]));
        params.insert(
            "selectInterfaces".into(),
            json!(["ip", "dns", "port", "main", "type", "useip", "available", "error", "details"]),
        );
        params.insert("selectGraphs".into(), json!("count"));
        params.insert("selectHttpTests".into(), json!("count"));
        params.insert("selectTags".into(), json!(["tag", "value"]));
        params.insert("selectInheritedTags".into(), json!(["tag", "value"]));
    } else {
        params.insert("output".into(), json!(["hostid"]));
    }

    params.insert("groupids".into(), json!(query.groupids));
    params.insert("evaltype".into(), json!(query.evaltype.code()));
    if !query.tags.is_empty() {
        let tags: Vec<Value> = query
            .tags
            .iter()
            .map(|t| json!({ "tag": t.tag, "value": t.value, "operator": t.operator.code() }))
            .collect();
        params.insert("tags".into(), Value::Array(tags));
        params.insert("inheritedTags".into(), json!(true));
    }
    if let Some(severities) = &query.severities {
        let levels: Vec<u8> = severities.iter().map(|s| s.level()).collect();
        params.insert("severities".into(), json!(levels));
    }
    if let Some(suppressed) = query.with_problems_suppressed {
        params.insert("withProblemsSuppressed".into(), json!(suppressed));
    }

    let mut search = Map::new();
    for (field, value) in [("name", &query.name), ("ip", &query.ip), ("dns", &query.dns)] {
        if let Some(value) = value {
            search.insert(field.into(), json!(value));
        }
    }
    if !search.is_empty() {
        params.insert("search".into(), Value::Object(search));
    }

    let mut filter = Map::new();
    if let Some(status) = query.status {
        filter.insert("status".into(), json!(status.code()));
    }
    if let Some(port) = &query.port {
        filter.insert("port".into(), json!(port));
    }
    if !query.include_maintenance {
        filter.insert("maintenance_status".into(), json!(HOST_MAINTENANCE_STATUS_OFF));
    }
    if !filter.is_empty() {
        params.insert("filter".into(), Value::Object(filter));
    }

    params.insert("sortfield".into(), json!("name"));
    if let Some(limit) = query.limit {
        params.insert("limit".into(), json!(limit));
    }

    Value::Object(params)
}

fn problem_params(query: &ProblemQuery) -> Value {
    let mut params = Map::new();
    params.insert("output".into(), json!(["eventid", "objectid", "severity"]));
    params.insert("objectids".into(), json!(query.objectids));
    params.insert("source".into(), json!(EVENT_SOURCE_TRIGGERS));
    params.insert("object".into(), json!(EVENT_OBJECT_TRIGGER));
    if let Some(suppressed) = query.suppressed {
        params.insert("suppressed".into(), json!(suppressed));
    }
    Value::Object(params)
}

// ==================== Wire formats ====================

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    data: Option<String>,
}

/// 整数或数字字符串
fn de_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn de_u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = de_u64(deserializer)?;
    u8::try_from(value).map_err(serde::de::Error::custom)
}

struct Count(u64);

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        de_u64(deserializer).map(Count)
    }
}

#[derive(Deserialize)]
struct WireGroup {
    #[serde(deserialize_with = "de_u64")]
    groupid: u64,
    name: String,
}

#[derive(Deserialize)]
struct WireHostRef {
    #[serde(deserialize_with = "de_u64")]
    hostid: u64,
}

#[derive(Deserialize)]
struct WireTrigger {
    #[serde(deserialize_with = "de_u64")]
    triggerid: u64,
    #[serde(default)]
    hosts: Vec<WireHostRef>,
}

#[derive(Deserialize)]
struct WireProblem {
    #[serde(deserialize_with = "de_u64")]
    eventid: u64,
    #[serde(deserialize_with = "de_u64")]
    objectid: u64,
    #[serde(deserialize_with = "de_u64")]
    severity: u64,
}

#[derive(Deserialize)]
struct WireItemCount {
    #[serde(deserialize_with = "de_u64")]
    hostid: u64,
    #[serde(deserialize_with = "de_u64")]
    rowscount: u64,
}

#[derive(Deserialize)]
struct WireTemplate {
    #[serde(deserialize_with = "de_u64")]
    templateid: u64,
}

#[derive(Deserialize)]
struct WireInterface {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    dns: String,
    #[serde(default)]
    port: String,
    #[serde(default, deserialize_with = "de_u8")]
    main: u8,
    #[serde(rename = "type", default, deserialize_with = "de_u8")]
    kind: u8,
    #[serde(default, deserialize_with = "de_u8")]
    useip: u8,
    #[serde(default, deserialize_with = "de_u8")]
    available: u8,
    #[serde(default)]
    error: String,
    #[serde(default)]
    details: Option<Value>,
}

#[derive(Deserialize)]
struct WireHost {
    #[serde(deserialize_with = "de_u64")]
    hostid: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    interfaces: Vec<WireInterface>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(rename = "inheritedTags", default)]
    inherited_tags: Vec<Tag>,
    #[serde(default)]
    graphs: Option<Count>,
    #[serde(rename = "httpTests", default)]
    http_tests: Option<Count>,
}

impl WireHost {
    fn into_record(self) -> HostRecord {
        HostRecord {
            hostid: self.hostid,
            name: self.name,
            status: self
                .status
                .and_then(|s| s.parse::<u8>().ok())
                .map(HostStatus::from_code),
            interfaces: self
                .interfaces
                .into_iter()
                .map(|i| Interface {
                    ip: i.ip,
                    dns: i.dns,
                    port: i.port,
                    main: i.main,
                    kind: i.kind,
                    useip: i.useip,
                    available: i.available,
                    error: i.error,
                    details: i.details,
                })
                .collect(),
            tags: self.tags,
            inherited_tags: self.inherited_tags,
            graphs: self.graphs.map(|c| c.0).unwrap_or(0),
            http_tests: self.http_tests.map(|c| c.0).unwrap_or(0),
        }
    }
}
