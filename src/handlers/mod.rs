//! HTTP 处理器模块

pub mod health;
pub mod host_tree;
pub mod menu;
