// Health Probe Port
// Queries the API server's health endpoint (readiness polling, `health` command)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Health endpoint path, relative to the API base URL
pub const HEALTH_ENDPOINT: &str = "/api/v1/health";

/// Body returned by the API server's health endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub is_ready: bool,
    #[serde(default)]
    pub loaded_models: Vec<String>,
    #[serde(default)]
    pub gpu_memory_used_gb: f64,
    #[serde(default)]
    pub gpu_memory_total_gb: f64,
}

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("API server unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Health endpoint returned HTTP {0}")]
    BadStatus(u16),

    #[error("Invalid health response: {0}")]
    InvalidBody(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Full health URL for an API base URL (trailing slashes tolerated)
pub fn health_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), HEALTH_ENDPOINT)
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// One health request against `base_url`
    async fn check(&self, base_url: &str) -> Result<HealthReport, HealthError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Unreachable for the first `failures` calls, healthy afterwards
    pub struct MockHealthProbe {
        failures: Option<usize>,
        calls: Mutex<Vec<String>>,
    }

    impl MockHealthProbe {
        pub fn healthy_after(failures: usize) -> Self {
            Self {
                failures: Some(failures),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn never_healthy() -> Self {
            Self {
                failures: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn urls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HealthProbe for MockHealthProbe {
        async fn check(&self, base_url: &str) -> Result<HealthReport, HealthError> {
            let attempt = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(base_url.to_string());
                calls.len()
            };

            match self.failures {
                Some(failures) if attempt > failures => Ok(HealthReport {
                    status: "healthy".to_string(),
                    is_ready: true,
                    loaded_models: vec!["mock-model".to_string()],
                    gpu_memory_used_gb: 0.0,
                    gpu_memory_total_gb: 0.0,
                }),
                _ => Err(HealthError::Unreachable {
                    url: health_url(base_url),
                    reason: "connection refused".to_string(),
                }),
            }
        }
    }
}
