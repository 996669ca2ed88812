//! HTTP 中间件
//! 应用状态与请求追踪

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{Filter, FILTER_IDX};
use crate::plugin::{FilterRegistry, Menu, PluginModule};
use crate::repository::MonitoringApi;
use crate::services::HostTreeService;

/// 应用状态
///
/// 启动后不再变化，各请求通过 Arc 共享。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub host_tree_service: Arc<HostTreeService>,
    pub filters: Arc<FilterRegistry>,
    pub menu: Arc<Menu>,
}

impl AppState {
    /// 注册插件菜单与过滤器命名空间
    pub fn new(config: AppConfig, api: Arc<dyn MonitoringApi>) -> Self {
        let mut filters = FilterRegistry::new();
        PluginModule::register_filters(&mut filters);

        let mut menu = Menu::monitoring_default();
        PluginModule::init(&mut menu);

        let host_tree_service = Arc::new(HostTreeService::new(api, config.view.clone()));

        Self {
            config,
            host_tree_service,
            filters: Arc::new(filters),
            menu: Arc::new(menu),
        }
    }

    /// 主机树视图的默认过滤条件
    pub fn filter_defaults(&self) -> Result<&Filter, AppError> {
        self.filters.defaults(FILTER_IDX).ok_or_else(|| {
            tracing::error!(idx = FILTER_IDX, "Filter namespace not registered");
            AppError::Internal
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 指标标签只使用静态字符串
        let method_name = match method.as_str() {
            "GET" => "GET",
            "HEAD" => "HEAD",
            "OPTIONS" => "OPTIONS",
            _ => "OTHER",
        };
        let status_code = match status {
            200 => "200",
            400 => "400",
            404 => "404",
            500 => "500",
            502 => "502",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_code)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        // 在响应头中添加 trace_id
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_or_generate_trace_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "test-trace-123".parse().unwrap());

        let trace_id = extract_or_generate_trace_id(&headers);
        assert_eq!(trace_id, "test-trace-123");

        let headers = HeaderMap::new();
        let trace_id = extract_or_generate_trace_id(&headers);
        assert!(!trace_id.is_empty());
        assert_ne!(trace_id, "test-trace-123");
    }
}
