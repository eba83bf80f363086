use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STREAM_IDLE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_QUEUE_POLL_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub triage_idle_timeout: Duration,
    pub queue_poll_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            triage_idle_timeout: Duration::from_secs(DEFAULT_STREAM_IDLE_TIMEOUT_SECS),
            queue_poll_interval: Duration::from_secs(DEFAULT_QUEUE_POLL_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("TRIAGE_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("TRIAGE_API_BASE_URL not set, using default");
                    DEFAULT_API_BASE_URL.to_string()
                }),
            request_timeout: secs_from_env(
                "TRIAGE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            triage_idle_timeout: secs_from_env(
                "TRIAGE_STREAM_IDLE_TIMEOUT_SECS",
                DEFAULT_STREAM_IDLE_TIMEOUT_SECS,
            ),
            queue_poll_interval: secs_from_env("TRIAGE_QUEUE_POLL_SECS", DEFAULT_QUEUE_POLL_SECS),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - check TRIAGE_* environment variables");
        }

        config
    }

    /// Config pointing at an explicit backend, other settings defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
            && !self.request_timeout.is_zero()
            && !self.triage_idle_timeout.is_zero()
    }
}

fn secs_from_env(name: &str, default_secs: u64) -> Duration {
    match env::var(name) {
        Ok(raw) => Duration::from_secs(parse_secs(name, &raw, default_secs)),
        Err(_) => Duration::from_secs(default_secs),
    }
}

fn parse_secs(name: &str, raw: &str, default_secs: u64) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => {
            warn!("{} has invalid value {:?}, using {}s", name, raw, default_secs);
            default_secs
        }
        Ok(secs) => secs,
    }
}
