#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
pub const DEFAULT_USER_AGENT: &str = concat!("biz-dashboard/", env!("CARGO_PKG_VERSION"));

/// Resolved settings handed to the dashboard at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub backend_url: String,
    pub user_agent: String,
}

impl DashboardConfig {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            ..Self::default()
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ConfigProvider for DashboardConfig {
    fn backend_url(&self) -> &str {
        &self.backend_url
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Validate for DashboardConfig {
    fn validate(&self) -> Result<()> {
        validate_url("backend_url", &self.backend_url)?;
        validate_non_empty_string("user_agent", &self.user_agent)?;
        Ok(())
    }
}
