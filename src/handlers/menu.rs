//! 菜单处理器

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{middleware::AppState, plugin::Menu};

/// 含插件菜单项的主菜单
pub async fn get_menu(State(state): State<Arc<AppState>>) -> Json<Menu> {
    Json(state.menu.as_ref().clone())
}
