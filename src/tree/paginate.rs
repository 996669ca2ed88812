//! 主机列表分页与页面 URL

use super::collector::HostMap;
use crate::models::{Filter, PageLink, Paging};

/// 视图的 action 参数
pub const VIEW_ACTION: &str = "bghost.view";

/// 页面 URL：基础地址 + 固定的过滤参数，页码追加在最后
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    base: String,
    args: Vec<(String, String)>,
}

impl PageUrl {
    pub fn new(base: impl Into<String>, args: Vec<(String, String)>) -> Self {
        Self {
            base: base.into(),
            args,
        }
    }

    /// 携带所有非默认过滤字段与展开组的视图 URL
    pub fn for_filter(base: impl Into<String>, filter: &Filter, defaults: &Filter) -> Self {
        let mut args = vec![("action".to_string(), VIEW_ACTION.to_string())];
        args.extend(filter.url_args(defaults));
        Self::new(base, args)
    }

    /// 不带页码
    pub fn view(&self) -> String {
        self.render(None)
    }

    pub fn page(&self, page: u32) -> String {
        self.render(Some(page))
    }

    fn render(&self, page: Option<u32>) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.args {
            query.append_pair(key, value);
        }
        if let Some(page) = page {
            query.append_pair("page", &page.to_string());
        }
        let query = query.finish();

        if query.is_empty() {
            self.base.clone()
        } else {
            format!("{}?{}", self.base, query)
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    rows_per_page: u32,
    search_limit: usize,
    page_window: u32,
}

impl Paginator {
    pub fn new(rows_per_page: u32, search_limit: usize, page_window: u32) -> Self {
        Self {
            rows_per_page: rows_per_page.max(1),
            search_limit,
            page_window: page_window.max(1),
        }
    }

    /// 按遍历顺序合并各根组的主机，并截断到搜索上限
    ///
    /// 返回合并结果以及是否发生了截断。
    pub fn concat(&self, collections: Vec<HostMap>) -> (HostMap, bool) {
        let mut all = HostMap::new();
        for hosts in collections {
            all.extend(hosts);
        }

        let limit_exceeded = all.len() > self.search_limit;
        if limit_exceeded {
            all.truncate(self.search_limit);
        }
        (all, limit_exceeded)
    }

    /// 取第 `page` 页（从 1 开始）；超出末页时为空页
    pub fn paginate(
        &self,
        page: u32,
        hosts: &HostMap,
        limit_exceeded: bool,
        url: &PageUrl,
    ) -> (HostMap, Paging) {
        let page = page.max(1);
        let rows = self.rows_per_page as usize;
        let total = hosts.len();
        let page_count = total.div_ceil(rows) as u32;

        let offset = (page as usize - 1).saturating_mul(rows);
        let slice = hosts.slice(offset, rows);
        let (from, to) = if slice.is_empty() {
            (0, 0)
        } else {
            (offset + 1, offset + slice.len())
        };

        let paging = Paging {
            page,
            rows_per_page: self.rows_per_page,
            total,
            page_count,
            from,
            to,
            limit_exceeded,
            links: self.links(page, page_count, url),
        };

        (slice, paging)
    }

    fn links(&self, page: u32, page_count: u32, url: &PageUrl) -> Vec<PageLink> {
        if page_count <= 1 {
            return Vec::new();
        }

        let anchor = page.min(page_count);
        let link = |label: String, target: u32| PageLink {
            label,
            page: target,
            url: url.page(target),
            current: target == page,
        };

        let mut links = Vec::new();
        if page > 1 {
            links.push(link("First".to_string(), 1));
            links.push(link("Previous".to_string(), (page - 1).min(page_count)));
        }

        let start = anchor
            .saturating_sub(self.page_window / 2)
            .min(page_count.saturating_sub(self.page_window) + 1)
            .max(1);
        let end = (start + self.page_window - 1).min(page_count);
        for target in start..=end {
            links.push(link(target.to_string(), target));
        }

        if page < page_count {
            links.push(link("Next".to_string(), page + 1));
            links.push(link("Last".to_string(), page_count));
        }

        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupId, Host, HostStatus, SeverityCounts};

    fn hosts(n: u64) -> HostMap {
        (1..=n)
            .map(|id| Host {
                id,
                name: format!("host{}", id),
                status: HostStatus::Enabled,
                interfaces: Vec::new(),
                problem_count: SeverityCounts::new(),
                tags: Vec::new(),
                items_count: 0,
                graphs: 0,
                dashboards: 0,
                http_tests: 0,
                group_names: vec!["g".to_string()],
            })
            .collect()
    }

    fn url() -> PageUrl {
        PageUrl::for_filter("zabbix.php", &Filter::default(), &Filter::default())
    }

    #[test]
    fn test_page_slices() {
        let paginator = Paginator::new(50, 1000, 11);
        let all = hosts(120);

        let (first, paging) = paginator.paginate(1, &all, false, &url());
        assert_eq!(first.len(), 50);
        assert_eq!(paging.page_count, 3);
        assert_eq!((paging.from, paging.to), (1, 50));

        let (last, paging) = paginator.paginate(3, &all, false, &url());
        assert_eq!(last.len(), 20);
        assert_eq!(last.ids().first(), Some(&101));
        assert_eq!((paging.from, paging.to), (101, 120));
    }

    #[test]
    fn test_page_beyond_last_is_empty() {
        let paginator = Paginator::new(50, 1000, 11);
        let (page, paging) = paginator.paginate(9, &hosts(10), false, &url());
        assert!(page.is_empty());
        assert!(paging.is_empty());
        assert_eq!(paging.total, 10);
    }

    #[test]
    fn test_empty_input() {
        let paginator = Paginator::new(50, 1000, 11);
        let (page, paging) = paginator.paginate(1, &HostMap::new(), false, &url());
        assert!(page.is_empty());
        assert_eq!(paging.page_count, 0);
        assert!(paging.links.is_empty());
    }

    #[test]
    fn test_concat_dedups_and_truncates() {
        let paginator = Paginator::new(50, 3, 11);
        let (all, exceeded) = paginator.concat(vec![hosts(2), hosts(4)]);
        assert!(exceeded);
        assert_eq!(all.ids(), &[1, 2, 3]);

        let (all, exceeded) = paginator.concat(vec![hosts(2), hosts(3)]);
        assert!(!exceeded);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_links_carry_filter_and_expanded_groups() {
        let defaults = Filter::default();
        let filter = Filter {
            name: "web".to_string(),
            expanded_groups: vec![GroupId::Real(4), GroupId::Synthetic(100000)],
            ..Filter::default()
        };
        let url = PageUrl::for_filter("zabbix.php", &filter, &defaults);
        let paginator = Paginator::new(10, 1000, 5);

        let (_, paging) = paginator.paginate(2, &hosts(35), false, &url);
        let labels: Vec<&str> = paging.links.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["First", "Previous", "1", "2", "3", "4", "Next", "Last"]);

        let next = paging.links.iter().find(|l| l.label == "Next").unwrap();
        assert_eq!(
            next.url,
            "zabbix.php?action=bghost.view&name=web&expanded_groups=4%2Cp100000&page=3"
        );
        assert!(paging.links.iter().any(|l| l.label == "2" && l.current));
    }

    #[test]
    fn test_link_window_is_bounded() {
        let paginator = Paginator::new(1, 1000, 5);
        let (_, paging) = paginator.paginate(10, &hosts(20), false, &url());
        let numbered: Vec<u32> = paging
            .links
            .iter()
            .filter(|l| l.label.parse::<u32>().is_ok())
            .map(|l| l.page)
            .collect();
        assert_eq!(numbered, vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_view_url_without_page() {
        assert_eq!(url().view(), "zabbix.php?action=bghost.view");
    }
}
