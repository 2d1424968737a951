use crate::domain::model::{BusinessMetrics, BusinessQuery, HeadlineResponse};
use crate::domain::ports::{BusinessBackend, ConfigProvider};
use crate::utils::error::{DashboardError, Result};
use crate::utils::validation::validate_range;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

pub const BUSINESS_DATA_PATH: &str = "business-data";
pub const REGENERATE_HEADLINE_PATH: &str = "regenerate-headline";

/// reqwest-backed client for the dashboard backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder().user_agent(config.user_agent()).build()?;
        Self::with_client(client, config.backend_url())
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| DashboardError::InvalidConfigValueError {
                field: "backend_url".to_string(),
                value: base_url.to_string(),
                reason: format!("Invalid URL format: {}", e),
            })?;

        // 確保 join 時保留 base path (例如 http://host/api/)
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DashboardError::ConfigError {
                message: format!("Cannot build endpoint '{}': {}", path, e),
            })
    }

    async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T> {
        let status = response.status();
        tracing::debug!("Backend response status: {} ({})", status, url);

        if !status.is_success() {
            return Err(DashboardError::BackendStatusError {
                endpoint: url.path().to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| DashboardError::InvalidPayloadError {
            endpoint: url.path().to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl BusinessBackend for HttpBackend {
    async fn fetch_metrics(&self, query: &BusinessQuery) -> Result<BusinessMetrics> {
        let url = self.endpoint(BUSINESS_DATA_PATH)?;
        tracing::debug!("POST {} name={:?} location={:?}", url, query.name, query.location);

        let response = self.client.post(url.clone()).json(query).send().await?;
        let metrics: BusinessMetrics = Self::decode(&url, response).await?;

        validate_range("rating", metrics.rating, 0.0, 5.0).map_err(|e| {
            DashboardError::InvalidPayloadError {
                endpoint: url.path().to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(metrics)
    }

    async fn regenerate_headline(&self, query: &BusinessQuery) -> Result<String> {
        let mut url = self.endpoint(REGENERATE_HEADLINE_PATH)?;
        url.query_pairs_mut()
            .append_pair("name", &query.name)
            .append_pair("location", &query.location);
        tracing::debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let body: HeadlineResponse = Self::decode(&url, response).await?;
        Ok(body.headline)
    }

    fn describe(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let backend = HttpBackend::new("http://localhost:3001/api").unwrap();
        assert_eq!(
            backend.endpoint(BUSINESS_DATA_PATH).unwrap().as_str(),
            "http://localhost:3001/api/business-data"
        );
        assert_eq!(backend.describe(), "http://localhost:3001/api");
    }

    #[test]
    fn test_endpoint_at_root() {
        let backend = HttpBackend::new("http://localhost:3001").unwrap();
        assert_eq!(
            backend.endpoint(REGENERATE_HEADLINE_PATH).unwrap().as_str(),
            "http://localhost:3001/regenerate-headline"
        );
        assert_eq!(backend.describe(), "http://localhost:3001");
    }

    #[test]
    fn test_rejects_malformed_base_url() {
        let err = HttpBackend::new("not a url").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfigValueError { .. }));
    }
}
