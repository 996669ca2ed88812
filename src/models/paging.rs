//! 分页结果

use serde::Serialize;

/// 导航链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub label: String,
    pub page: u32,
    pub url: String,
    pub current: bool,
}

/// 当前页的分页元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paging {
    pub page: u32,
    pub rows_per_page: u32,
    pub total: usize,
    pub page_count: u32,
    /// 本页第一条的序号（从 1 开始），空页为 0
    pub from: usize,
    /// 本页最后一条的序号
    pub to: usize,
    /// 结果被搜索上限截断
    pub limit_exceeded: bool,
    pub links: Vec<PageLink>,
}

impl Paging {
    pub fn is_empty(&self) -> bool {
        self.from == 0
    }
}
