//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装 API 令牌

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApiConfig {
    /// JSON-RPC 入口，例如 "https://monitor.example.com/api_jsonrpc.php"
    #[validate(url)]
    pub url: String,
    /// API 令牌（使用 Secret 包装，防止日志泄露）
    pub token: Secret<String>,
    /// 单次调用超时时间（秒）
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ViewConfig {
    /// 每页主机数
    #[validate(range(min = 1, max = 10000))]
    pub rows_per_page: u32,
    /// 单次视图最多展示的主机数
    #[validate(range(min = 1, max = 100000))]
    pub search_limit: usize,
    /// 生成页面链接所用的前端地址
    #[validate(length(min = 1))]
    pub base_url: String,
    /// 分页导航中同时显示的页码数
    #[validate(range(min = 1, max = 50))]
    pub page_window: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub logging: LoggingConfig,
    #[validate(nested)]
    pub api: ApiConfig,
    #[validate(nested)]
    pub view: ViewConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("api.url", "http://localhost/api_jsonrpc.php")?
            .set_default("api.timeout_secs", 30)?
            .set_default("view.rows_per_page", 50)?
            .set_default("view.search_limit", 1000)?
            .set_default("view.base_url", "zabbix.php")?
            .set_default("view.page_window", 11)?;

        // 从环境变量加载配置（前缀为 HOSTTREE_）
        settings = settings.add_source(
            Environment::with_prefix("HOSTTREE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        Validate::validate(self).map_err(|e| ConfigError::Message(e.to_string()))?;

        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.api.token.expose_secret().trim().is_empty() {
            return Err(ConfigError::Message("API token must not be empty".to_string()));
        }

        if self.view.rows_per_page as usize > self.view.search_limit {
            return Err(ConfigError::Message(
                "rows_per_page must not exceed search_limit".to_string(),
            ));
        }

        Ok(())
    }
}
