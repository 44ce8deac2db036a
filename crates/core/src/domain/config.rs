// Launch Configuration
// Resolved once at entry (env > default), never mutated once a launch starts

use std::time::Duration;

use super::error::ConfigError;

// Environment variable names
pub const ENV_API_HOST: &str = "API_HOST";
pub const ENV_API_PORT: &str = "API_PORT";
pub const ENV_UI_PORT: &str = "UI_PORT";
pub const ENV_API_URL: &str = "API_URL";
pub const ENV_START_BACKEND: &str = "START_BACKEND";
pub const ENV_PYTHON_BIN: &str = "PYTHON_BIN";
pub const ENV_UI_HOST: &str = "UI_HOST";
pub const ENV_WEIGHTS_DIR: &str = "WEIGHTS_DIR";
pub const ENV_UI_SHARE: &str = "UI_SHARE";
pub const ENV_GRACE_SECS: &str = "LAUNCHPAD_GRACE_SECS";
pub const ENV_WAIT_HEALTHY: &str = "LAUNCHPAD_WAIT_HEALTHY";

// Defaults
pub const DEFAULT_API_HOST: &str = "0.0.0.0";
pub const DEFAULT_API_PORT: &str = "8000";
pub const DEFAULT_UI_PORT: &str = "7860";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_PYTHON_BIN: &str = "python";

/// Grace period before the one-shot liveness probe (5s)
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Interval between health polls when readiness polling is enabled (1s)
pub const DEFAULT_HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Health poll attempts when readiness polling is enabled without a count
pub const DEFAULT_HEALTH_POLL_ATTEMPTS: u32 = 60;

/// How the launcher decides the API server is up before starting the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadinessPolicy {
    /// Sleep for the grace period, then one liveness check
    #[default]
    GracePeriod,
    /// Poll the health endpoint, checking liveness before every attempt
    HealthPoll { interval: Duration, attempts: u32 },
}

impl ReadinessPolicy {
    pub fn health_poll(attempts: u32) -> Self {
        ReadinessPolicy::HealthPoll {
            interval: DEFAULT_HEALTH_POLL_INTERVAL,
            attempts,
        }
    }
}

impl std::fmt::Display for ReadinessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadinessPolicy::GracePeriod => write!(f, "grace-period"),
            ReadinessPolicy::HealthPoll { interval, attempts } => {
                write!(f, "health-poll ({} x {}ms)", attempts, interval.as_millis())
            }
        }
    }
}

/// Resolved launch configuration
///
/// Service-facing values are kept as strings and passed through uninterpreted;
/// a non-numeric port is the child's problem, not the launcher's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub api_host: String,
    pub api_port: String,
    pub ui_port: String,
    /// Explicitly supplied API URL, if any
    pub api_url_override: Option<String>,
    pub start_backend: bool,
    pub python_bin: String,
    pub ui_host: Option<String>,
    pub weights_dir: Option<String>,
    pub share: bool,
    pub grace_period: Duration,
    pub readiness: ReadinessPolicy,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            api_port: DEFAULT_API_PORT.to_string(),
            ui_port: DEFAULT_UI_PORT.to_string(),
            api_url_override: None,
            start_backend: false,
            python_bin: DEFAULT_PYTHON_BIN.to_string(),
            ui_host: None,
            weights_dir: None,
            share: false,
            grace_period: DEFAULT_GRACE_PERIOD,
            readiness: ReadinessPolicy::GracePeriod,
        }
    }
}

impl LaunchConfig {
    /// Resolve from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup (present and non-empty wins)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let grace_period = match get(ENV_GRACE_SECS) {
            Some(raw) => Duration::from_secs(parse_u64(ENV_GRACE_SECS, &raw)?),
            None => defaults.grace_period,
        };

        let readiness = match get(ENV_WAIT_HEALTHY) {
            Some(raw) => parse_readiness(&raw)?,
            None => defaults.readiness,
        };

        Ok(Self {
            api_host: get(ENV_API_HOST).unwrap_or(defaults.api_host),
            api_port: get(ENV_API_PORT).unwrap_or(defaults.api_port),
            ui_port: get(ENV_UI_PORT).unwrap_or(defaults.ui_port),
            api_url_override: get(ENV_API_URL),
            start_backend: get(ENV_START_BACKEND)
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.start_backend),
            python_bin: get(ENV_PYTHON_BIN).unwrap_or(defaults.python_bin),
            ui_host: get(ENV_UI_HOST),
            weights_dir: get(ENV_WEIGHTS_DIR),
            share: get(ENV_UI_SHARE)
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.share),
            grace_period,
            readiness,
        })
    }

    /// Layer command-line overrides on top (empty strings are ignored)
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        fn take(target: &mut String, value: Option<String>) {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                *target = v;
            }
        }

        take(&mut self.api_host, overrides.api_host);
        take(&mut self.api_port, overrides.api_port);
        take(&mut self.ui_port, overrides.ui_port);
        if let Some(url) = overrides.api_url.filter(|v| !v.is_empty()) {
            self.api_url_override = Some(url);
        }
        if overrides.start_backend {
            self.start_backend = true;
        }
        match overrides.wait_healthy {
            Some(0) => self.readiness = ReadinessPolicy::GracePeriod,
            Some(attempts) => self.readiness = ReadinessPolicy::health_poll(attempts),
            None => {}
        }
        self
    }

    /// API URL handed to a standalone UI: explicit override or the fixed default
    pub fn api_url(&self) -> &str {
        self.api_url_override.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// API URL for the combined flow: explicit override, else derived from the API port
    pub fn derived_api_url(&self) -> String {
        match &self.api_url_override {
            Some(url) => url.clone(),
            None => format!("http://localhost:{}", self.api_port),
        }
    }
}

/// Command-line overrides; `None` leaves the env/default value in place
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub api_host: Option<String>,
    pub api_port: Option<String>,
    pub ui_port: Option<String>,
    pub api_url: Option<String>,
    pub start_backend: bool,
    pub wait_healthy: Option<u32>,
}

/// Truthy words enable a flag; anything else leaves it off
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

// "0"/"false" disables polling, a truthy word uses the default attempt count
fn parse_readiness(raw: &str) -> Result<ReadinessPolicy, ConfigError> {
    let trimmed = raw.trim();
    if let Ok(attempts) = trimmed.parse::<u32>() {
        return Ok(match attempts {
            0 => ReadinessPolicy::GracePeriod,
            n => ReadinessPolicy::health_poll(n),
        });
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(ReadinessPolicy::health_poll(
            DEFAULT_HEALTH_POLL_ATTEMPTS,
        )),
        "false" | "no" | "off" => Ok(ReadinessPolicy::GracePeriod),
        _ => Err(ConfigError::InvalidValue {
            key: ENV_WAIT_HEALTHY.to_string(),
            value: raw.to_string(),
            reason: "expected an attempt count or a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_unset_resolves_to_defaults() {
        let config = LaunchConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.api_host, "0.0.0.0");
        assert_eq!(config.api_port, "8000");
        assert_eq!(config.ui_port, "7860");
        assert_eq!(config.api_url(), "http://localhost:8000");
        assert!(!config.start_backend);
        assert_eq!(config.grace_period, Duration::from_secs(5));
        assert_eq!(config.readiness, ReadinessPolicy::GracePeriod);
        assert_eq!(config, LaunchConfig::default());
    }

    #[test]
    fn test_set_values_pass_through_verbatim() {
        let config = LaunchConfig::from_lookup(lookup_from(&[
            (ENV_API_HOST, "127.0.0.1"),
            (ENV_API_PORT, "not-a-port"),
            (ENV_UI_PORT, "07861"),
            (ENV_API_URL, "http://gpu-box:9000/"),
            (ENV_START_BACKEND, "true"),
        ]))
        .unwrap();

        assert_eq!(config.api_host, "127.0.0.1");
        assert_eq!(config.api_port, "not-a-port");
        assert_eq!(config.ui_port, "07861");
        assert_eq!(config.api_url(), "http://gpu-box:9000/");
        assert!(config.start_backend);
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = LaunchConfig::from_lookup(lookup_from(&[
            (ENV_API_PORT, ""),
            (ENV_API_URL, ""),
            (ENV_START_BACKEND, ""),
        ]))
        .unwrap();

        assert_eq!(config.api_port, DEFAULT_API_PORT);
        assert_eq!(config.api_url_override, None);
        assert!(!config.start_backend);
    }

    #[test]
    fn test_derived_url_follows_api_port() {
        let config = LaunchConfig::from_lookup(lookup_from(&[(ENV_API_PORT, "9001")])).unwrap();

        assert_eq!(config.derived_api_url(), "http://localhost:9001");
        // Standalone UI keeps the fixed default
        assert_eq!(config.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_explicit_url_wins_over_derivation() {
        let config = LaunchConfig::from_lookup(lookup_from(&[
            (ENV_API_PORT, "9001"),
            (ENV_API_URL, "http://10.0.0.5:8000"),
        ]))
        .unwrap();

        assert_eq!(config.derived_api_url(), "http://10.0.0.5:8000");
    }

    #[test]
    fn test_flag_parsing() {
        for raw in ["1", "true", "TRUE", "yes", "On"] {
            assert!(parse_flag(raw), "{raw} should enable");
        }
        for raw in ["0", "false", "no", "maybe"] {
            assert!(!parse_flag(raw), "{raw} should not enable");
        }
    }

    #[test]
    fn test_malformed_grace_period_is_rejected() {
        let err = LaunchConfig::from_lookup(lookup_from(&[(ENV_GRACE_SECS, "soon")])).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_GRACE_SECS));
    }

    #[test]
    fn test_wait_healthy_variants() {
        let cases = [
            ("0", ReadinessPolicy::GracePeriod),
            ("off", ReadinessPolicy::GracePeriod),
            ("10", ReadinessPolicy::health_poll(10)),
            ("yes", ReadinessPolicy::health_poll(DEFAULT_HEALTH_POLL_ATTEMPTS)),
        ];
        for (raw, expected) in cases {
            let config = LaunchConfig::from_lookup(lookup_from(&[(ENV_WAIT_HEALTHY, raw)])).unwrap();
            assert_eq!(config.readiness, expected, "input {raw}");
        }

        assert!(LaunchConfig::from_lookup(lookup_from(&[(ENV_WAIT_HEALTHY, "eventually")])).is_err());
    }

    #[test]
    fn test_overrides_layer_on_top() {
        let config = LaunchConfig::from_lookup(lookup_from(&[(ENV_API_PORT, "9001")]))
            .unwrap()
            .apply(ConfigOverrides {
                api_port: Some("9100".to_string()),
                ui_port: Some(String::new()),
                start_backend: true,
                wait_healthy: Some(3),
                ..Default::default()
            });

        assert_eq!(config.api_port, "9100");
        assert_eq!(config.ui_port, DEFAULT_UI_PORT);
        assert!(config.start_backend);
        assert_eq!(config.readiness, ReadinessPolicy::health_poll(3));
    }
}
