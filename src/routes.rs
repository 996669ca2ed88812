//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new().route("/health", get(handlers::health::health_check));

    // 主机树视图
    let view_routes = Router::new()
        .route("/api/v1/hosts/tree", get(handlers::host_tree::get_host_tree))
        .route("/api/v1/hosts/tree/toggle", get(handlers::host_tree::toggle_group))
        .route("/api/v1/menu", get(handlers::menu::get_menu));

    Router::new()
        .merge(public_routes)
        .merge(view_routes)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
