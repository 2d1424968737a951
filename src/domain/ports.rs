use crate::domain::model::{BusinessMetrics, BusinessQuery};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait ConfigProvider: Send + Sync {
    fn backend_url(&self) -> &str;
    fn user_agent(&self) -> &str;
}

/// Remote service that produces the simulated business metrics.
#[async_trait]
pub trait BusinessBackend: Send + Sync {
    async fn fetch_metrics(&self, query: &BusinessQuery) -> Result<BusinessMetrics>;
    async fn regenerate_headline(&self, query: &BusinessQuery) -> Result<String>;

    /// Human-readable location of the backend, used in error notifications.
    fn describe(&self) -> String;
}
