pub mod bus;
pub mod dashboard;

pub use crate::domain::model::{
    BusinessMetrics, BusinessQuery, DashboardEvent, DashboardSnapshot, Notification,
    NotificationLevel, Operation, RequestStatus,
};
pub use crate::domain::ports::{BusinessBackend, ConfigProvider};
pub use crate::utils::error::Result;
