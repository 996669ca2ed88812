//! Business logic services layer

pub mod host_tree_service;

pub use host_tree_service::{HostTreeService, HostTreeView, SelectedGroup, ToggleResult};
