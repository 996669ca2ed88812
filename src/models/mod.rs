//! 数据模型模块
//! 组、主机、过滤条件、严重级别与分页

pub mod filter;
pub mod group;
pub mod host;
pub mod paging;
pub mod severity;

pub use filter::{Filter, SortField, SortOrder, TagEvalType, TagFilter, TagOperator, FILTER_IDX};
pub use group::{FlatGroup, Group, GroupId, SYNTHETIC_GROUP_ID_START};
pub use host::{merge_tags, Host, HostStatus, Interface, Tag};
pub use paging::{PageLink, Paging};
pub use severity::{Severity, SeverityCounts};
