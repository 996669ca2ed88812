//! 主机树处理器

use axum::{
    extract::{RawQuery, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::AppError,
    middleware::AppState,
    models::{Filter, GroupId},
    services::{HostTreeView, ToggleResult},
};

/// 主机树视图
///
/// 参数沿用平台前端的命名；缺失或非法的过滤字段取默认值。
pub async fn get_host_tree(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<HostTreeView>, AppError> {
    let defaults = state.filter_defaults()?;
    let filter = Filter::from_query(query.as_deref(), defaults);

    let view = state.host_tree_service.build_view(&filter, defaults).await?;
    Ok(Json(view))
}

/// 展开或折叠一个组
///
/// `groupid` 必填；`collapsed=1` 表示折叠，其余视为展开。
pub async fn toggle_group(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<ToggleResult>, AppError> {
    let defaults = state.filter_defaults()?;
    let query = query.unwrap_or_default();
    let filter = Filter::from_query(Some(query.as_str()), defaults);

    let mut group_id = None;
    let mut collapse = false;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "groupid" => {
                let parsed = value
                    .parse::<GroupId>()
                    .map_err(|e| AppError::bad_request(e.to_string()))?;
                group_id = Some(parsed);
            }
            "collapsed" => collapse = value.trim() == "1",
            _ => {}
        }
    }
    let group_id = group_id.ok_or_else(|| AppError::bad_request("groupid is required"))?;

    let result = state
        .host_tree_service
        .toggle(&filter, defaults, group_id, collapse)
        .await?;
    Ok(Json(result))
}
