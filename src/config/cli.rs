use crate::config::toml_config::TomlConfig;
use crate::config::DashboardConfig;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "biz-dashboard")]
#[command(about = "Analyze a local business: Google rating, review count and an SEO headline")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the dashboard backend
    #[arg(long, env = "BIZ_DASHBOARD_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log output format (overrides the config file)
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Analyze one business and print the result
    Analyze {
        #[arg(long)]
        name: String,

        #[arg(long)]
        location: String,

        /// Regenerate the headline this many times after the analysis
        #[arg(long, default_value_t = 0)]
        regenerate: usize,
    },
    /// Edit the form and trigger requests from a prompt
    Interactive,
}

/// Everything `main` needs after merging flags, file and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub dashboard: DashboardConfig,
    pub log_format: LogFormat,
    pub log_level: Option<String>,
}

impl CliConfig {
    /// 命令列參數 > 設定檔 > 預設值
    pub fn resolve(&self) -> Result<ResolvedSettings> {
        let file = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        let mut dashboard = file.to_dashboard_config();
        if let Some(url) = &self.backend_url {
            dashboard.backend_url = url.clone();
        }
        // the merged URL is what gets validated, a flag may replace a broken file value
        dashboard.validate()?;

        Ok(ResolvedSettings {
            dashboard,
            log_format: self.log_format.unwrap_or_else(|| file.log_format()),
            log_level: file.log_level().map(str::to_string),
        })
    }
}
