pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::HttpBackend;
pub use crate::config::{toml_config::TomlConfig, DashboardConfig};
pub use crate::core::{bus::EventBus, dashboard::BusinessDashboard};
pub use crate::domain::model::{
    BusinessMetrics, BusinessQuery, DashboardEvent, DashboardSnapshot, Notification,
    NotificationLevel, Operation, RequestStatus,
};
pub use crate::utils::error::{DashboardError, Result};
