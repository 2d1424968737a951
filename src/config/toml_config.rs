use crate::config::{DashboardConfig, DEFAULT_BACKEND_URL, DEFAULT_USER_AGENT};
use crate::utils::error::{DashboardError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional settings file. Every section and key may be omitted.
///
/// ```toml
/// [backend]
/// base_url = "${DASHBOARD_BACKEND}"
///
/// [logging]
/// level = "biz_dashboard=debug"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendSection {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DashboardError::TomlParseError {
            message: e.to_string(),
        })
    }

    /// 替換環境變數 (例如 ${DASHBOARD_BACKEND})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DashboardError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn backend_url(&self) -> &str {
        self.backend.base_url.as_deref().unwrap_or(DEFAULT_BACKEND_URL)
    }

    pub fn user_agent(&self) -> &str {
        self.backend.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.level.as_deref()
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging.format.unwrap_or_default()
    }

    pub fn to_dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            backend_url: self.backend_url().to_string(),
            user_agent: self.user_agent().to_string(),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_url("backend.base_url", self.backend_url())?;
        if let Some(agent) = &self.backend.user_agent {
            validate_non_empty_string("backend.user_agent", agent)?;
        }
        Ok(())
    }
}
