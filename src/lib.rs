//! 主机树服务库
//! 按组层级展示监控主机，附带问题数汇总、展开状态与分页

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod plugin;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
pub mod tree;
