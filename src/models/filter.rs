//! 主机树视图的过滤条件
//!
//! 请求参数沿用平台前端的命名（`groupids[]`、`tags[0][tag]` 等）。
//! 缺失或无法解析的字段一律回落到默认值，不会产生错误。

use serde::Serialize;
use std::collections::BTreeMap;

use super::group::GroupId;
use super::host::HostStatus;
use super::severity::Severity;

/// 本视图的过滤器命名空间
pub const FILTER_IDX: &str = "web.monitoring.bghosts";

/// 标签条件的组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagEvalType {
    /// 同名标签之间 OR，不同标签之间 AND
    AndOr,
    Or,
}

impl TagEvalType {
    pub fn code(self) -> u8 {
        match self {
            TagEvalType::AndOr => 0,
            TagEvalType::Or => 2,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(TagEvalType::AndOr),
            "2" => Some(TagEvalType::Or),
            _ => None,
        }
    }
}

/// 标签条件运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagOperator {
    Like,
    Equal,
    NotLike,
    NotEqual,
    Exists,
    NotExists,
}

impl TagOperator {
    pub fn code(self) -> u8 {
        match self {
            TagOperator::Like => 0,
            TagOperator::Equal => 1,
            TagOperator::NotLike => 2,
            TagOperator::NotEqual => 3,
            TagOperator::Exists => 4,
            TagOperator::NotExists => 5,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(TagOperator::Like),
            "1" => Some(TagOperator::Equal),
            "2" => Some(TagOperator::NotLike),
            "3" => Some(TagOperator::NotEqual),
            "4" => Some(TagOperator::Exists),
            "5" => Some(TagOperator::NotExists),
            _ => None,
        }
    }
}

/// 单个标签条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFilter {
    pub tag: String,
    pub value: String,
    pub operator: TagOperator,
}

impl TagFilter {
    pub fn new(tag: impl Into<String>, value: impl Into<String>, operator: TagOperator) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
            operator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Status,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// 按方向调整一个升序比较结果
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// 用户选择的全部过滤条件以及当前展开的组
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub name: String,
    pub groupids: Vec<u64>,
    pub ip: String,
    pub dns: String,
    pub port: String,
    /// None 表示任意状态
    pub status: Option<HostStatus>,
    pub evaltype: TagEvalType,
    pub tags: Vec<TagFilter>,
    pub severities: Vec<Severity>,
    pub show_suppressed: bool,
    /// false 时只显示不在维护期的主机
    pub include_maintenance: bool,
    /// 从 1 开始
    pub page: u32,
    pub sort: SortField,
    pub sortorder: SortOrder,
    pub expanded_groups: Vec<GroupId>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            name: String::new(),
            groupids: Vec::new(),
            ip: String::new(),
            dns: String::new(),
            port: String::new(),
            status: None,
            evaltype: TagEvalType::AndOr,
            tags: Vec::new(),
            severities: Vec::new(),
            show_suppressed: false,
            include_maintenance: true,
            page: 1,
            sort: SortField::Name,
            sortorder: SortOrder::Asc,
            expanded_groups: Vec::new(),
        }
    }
}

/// 拆分 `tags[0][tag]` 形式的参数名
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    let base = &key[..open];
    let indices = key[open..]
        .split('[')
        .filter_map(|part| part.strip_suffix(']'))
        .collect();
    (base, indices)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

#[derive(Default)]
struct PartialTag {
    tag: String,
    value: String,
    operator: Option<TagOperator>,
}

impl Filter {
    /// 从原始查询串解析
    pub fn from_query(query: Option<&str>, defaults: &Filter) -> Self {
        let pairs = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes());
        Self::from_pairs(pairs, defaults)
    }

    /// 从参数对解析，未给出或非法的字段取 `defaults` 中的值
    pub fn from_pairs<I, K, V>(pairs: I, defaults: &Filter) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = defaults.clone();
        let mut groupids: Option<Vec<u64>> = None;
        let mut severities: Option<Vec<Severity>> = None;
        let mut tags: Option<BTreeMap<String, PartialTag>> = None;

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            let (base, indices) = split_key(key);

            match base {
                "name" => filter.name = value.to_string(),
                "ip" => filter.ip = value.to_string(),
                "dns" => filter.dns = value.to_string(),
                "port" => filter.port = value.to_string(),
                "groupids" => {
                    let ids = groupids.get_or_insert_with(Vec::new);
                    if let Ok(id) = value.trim().parse::<u64>() {
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                }
                "status" => {
                    filter.status = match value.trim() {
                        "-1" => None,
                        "0" => Some(HostStatus::Enabled),
                        "1" => Some(HostStatus::Disabled),
                        _ => defaults.status,
                    }
                }
                "evaltype" => {
                    filter.evaltype = TagEvalType::from_code(value).unwrap_or(defaults.evaltype)
                }
                "tags" => {
                    let tags = tags.get_or_insert_with(BTreeMap::new);
                    if let [index, field] = indices.as_slice() {
                        let entry = tags.entry(index.to_string()).or_default();
                        match *field {
                            "tag" => entry.tag = value.to_string(),
                            "value" => entry.value = value.to_string(),
                            "operator" => entry.operator = TagOperator::from_code(value),
                            _ => {}
                        }
                    }
                }
                "severities" => {
                    let list = severities.get_or_insert_with(Vec::new);
                    if let Some(severity) =
                        value.trim().parse::<u8>().ok().and_then(Severity::from_level)
                    {
                        if !list.contains(&severity) {
                            list.push(severity);
                        }
                    }
                }
                "show_suppressed" => {
                    filter.show_suppressed = parse_flag(value).unwrap_or(defaults.show_suppressed)
                }
                "maintenance_status" => {
                    filter.include_maintenance =
                        parse_flag(value).unwrap_or(defaults.include_maintenance)
                }
                "page" => {
                    filter.page = value
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|page| *page >= 1)
                        .unwrap_or(defaults.page)
                }
                "sort" => {
                    filter.sort = match value.trim() {
                        "name" => SortField::Name,
                        "status" => SortField::Status,
                        _ => defaults.sort,
                    }
                }
                "sortorder" => {
                    filter.sortorder = match value.trim() {
                        "ASC" => SortOrder::Asc,
                        "DESC" => SortOrder::Desc,
                        _ => defaults.sortorder,
                    }
                }
                "expanded_groups" => {
                    let mut expanded: Vec<GroupId> = Vec::new();
                    for id in value.split(',').filter_map(|part| part.parse::<GroupId>().ok()) {
                        if !expanded.contains(&id) {
                            expanded.push(id);
                        }
                    }
                    filter.expanded_groups = expanded;
                }
                _ => {}
            }
        }

        if let Some(ids) = groupids {
            filter.groupids = ids;
        }
        if let Some(mut list) = severities {
            list.sort();
            filter.severities = list;
        }
        if let Some(tags) = tags {
            filter.tags = clean_tags(tags);
        }

        filter
    }

    /// 与默认值不同的字段，按固定顺序生成 URL 参数（不含 page）
    pub fn url_args(&self, defaults: &Filter) -> Vec<(String, String)> {
        let mut args = Vec::new();

        if self.name != defaults.name {
            args.push(("name".to_string(), self.name.clone()));
        }
        if self.groupids != defaults.groupids {
            for id in &self.groupids {
                args.push(("groupids[]".to_string(), id.to_string()));
            }
        }
        if self.ip != defaults.ip {
            args.push(("ip".to_string(), self.ip.clone()));
        }
        if self.dns != defaults.dns {
            args.push(("dns".to_string(), self.dns.clone()));
        }
        if self.port != defaults.port {
            args.push(("port".to_string(), self.port.clone()));
        }
        if self.status != defaults.status {
            let code = self.status.map(|s| s.code() as i8).unwrap_or(-1);
            args.push(("status".to_string(), code.to_string()));
        }
        if self.evaltype != defaults.evaltype {
            args.push(("evaltype".to_string(), self.evaltype.code().to_string()));
        }
        if self.tags != defaults.tags {
            for (i, tag) in self.tags.iter().enumerate() {
                args.push((format!("tags[{}][tag]", i), tag.tag.clone()));
                args.push((format!("tags[{}][value]", i), tag.value.clone()));
                args.push((format!("tags[{}][operator]", i), tag.operator.code().to_string()));
            }
        }
        if self.severities != defaults.severities {
            for severity in &self.severities {
                args.push(("severities[]".to_string(), severity.level().to_string()));
            }
        }
        if self.show_suppressed != defaults.show_suppressed {
            args.push(("show_suppressed".to_string(), (self.show_suppressed as u8).to_string()));
        }
        if self.include_maintenance != defaults.include_maintenance {
            args.push((
                "maintenance_status".to_string(),
                (self.include_maintenance as u8).to_string(),
            ));
        }
        if self.sort != defaults.sort {
            args.push(("sort".to_string(), self.sort.as_str().to_string()));
        }
        if self.sortorder != defaults.sortorder {
            args.push(("sortorder".to_string(), self.sortorder.as_str().to_string()));
        }
        if !self.expanded_groups.is_empty() {
            args.push(("expanded_groups".to_string(), self.expanded_groups_param()));
        }

        args
    }

    /// 逗号拼接的展开组列表
    pub fn expanded_groups_param(&self) -> String {
        self.expanded_groups
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// 丢弃标签名和值都为空的条目
fn clean_tags(tags: BTreeMap<String, PartialTag>) -> Vec<TagFilter> {
    let mut ordered: Vec<(usize, PartialTag)> = tags
        .into_iter()
        .map(|(index, tag)| (index.parse().unwrap_or(usize::MAX), tag))
        .collect();
    ordered.sort_by_key(|(index, _)| *index);

    ordered
        .into_iter()
        .map(|(_, tag)| tag)
        .filter(|tag| !(tag.tag.is_empty() && tag.value.is_empty()))
        .map(|tag| TagFilter {
            tag: tag.tag,
            value: tag.value,
            operator: tag.operator.unwrap_or(TagOperator::Like),
        })
        .collect()
}
