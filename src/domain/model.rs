use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 使用者輸入的查詢條件，提交前允許空字串
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessQuery {
    pub name: String,
    pub location: String,
}

impl BusinessQuery {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            location: self.location.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessMetrics {
    pub rating: f64,
    #[serde(rename = "reviews")]
    pub review_count: u64,
    pub headline: String,
}

impl BusinessMetrics {
    /// Copy of `self` with only the headline replaced.
    pub fn with_headline(&self, headline: String) -> Self {
        Self {
            headline,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadlineResponse {
    pub headline: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    Idle,
    InFlight,
}

impl RequestStatus {
    pub fn is_in_flight(self) -> bool {
        self == Self::InFlight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Analysis,
    Regeneration,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Analysis => write!(f, "analysis"),
            Operation::Regeneration => write!(f, "regeneration"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    StatusChanged {
        operation: Operation,
        status: RequestStatus,
    },
    MetricsUpdated(BusinessMetrics),
    Notification(Notification),
    /// A response arrived after one from a newer call of the same kind was applied.
    ResponseDiscarded { operation: Operation },
}

/// Point-in-time view of the dashboard for renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub query: BusinessQuery,
    pub metrics: Option<BusinessMetrics>,
    pub analysis: RequestStatus,
    pub regeneration: RequestStatus,
}
