// HTTP health probe implementation
// reason: reqwest for the API server's JSON health endpoint
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use launchpad_core::port::health::{health_url, HealthError, HealthProbe, HealthReport};

/// Per-request timeout for health checks (10s, same as the UI's own client)
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Health probe issuing `GET <base>/api/v1/health`
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    pub fn new(timeout: Duration) -> Result<Self, HealthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HealthError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self, base_url: &str) -> Result<HealthReport, HealthError> {
        let url = health_url(base_url);
        debug!(url = %url, "Checking API health");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HealthError::Unreachable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HealthError::BadStatus(status.as_u16()));
        }

        response
            .json::<HealthReport>()
            .await
            .map_err(|e| HealthError::InvalidBody(e.to_string()))
    }
}
