use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Validation error on '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Backend request failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Backend returned {status} for {endpoint}")]
    BackendStatusError { endpoint: String, status: u16 },

    #[error("Backend sent an invalid payload from {endpoint}: {reason}")]
    InvalidPayloadError { endpoint: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("TOML parsing error: {message}")]
    TomlParseError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Network,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DashboardError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } => ErrorCategory::Validation,
            Self::TransportError(_)
            | Self::BackendStatusError { .. }
            | Self::InvalidPayloadError { .. } => ErrorCategory::Network,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlParseError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 任何無法從後端取得成功回應的情況都視為「後端無法連線」
    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Network
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { field, .. } => format!("'{}' must not be empty", field),
            Self::TransportError(_) => "Could not reach the dashboard backend".to_string(),
            Self::BackendStatusError { status, .. } => {
                format!("The dashboard backend answered with HTTP {}", status)
            }
            Self::InvalidPayloadError { .. } => {
                "The dashboard backend sent data that could not be used".to_string()
            }
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            Self::TomlParseError { .. } => "The configuration file is not valid TOML".to_string(),
            Self::IoError(e) => format!("File system error: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => "Enter a non-empty business name and location",
            ErrorCategory::Network => {
                "Make sure the backend is running and --backend-url points at it"
            }
            ErrorCategory::Configuration => "Check the config file and command line flags",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}
