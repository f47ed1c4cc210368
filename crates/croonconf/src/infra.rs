//! Infrastructure configuration - fixed for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how to reach the upstream generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the generation API.
    /// Default: https://studio-api.suno.ai
    #[serde(default = "UpstreamConfig::default_base_url")]
    pub base_url: String,

    /// Model version sent with every submission.
    /// Default: chirp-v3-5
    #[serde(default = "UpstreamConfig::default_model")]
    pub model: String,

    /// User-Agent header for outbound requests.
    #[serde(default = "UpstreamConfig::default_user_agent")]
    pub user_agent: String,

    /// Per-request HTTP timeout in seconds.
    /// Default: 60
    #[serde(default = "UpstreamConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl UpstreamConfig {
    fn default_base_url() -> String {
        "https://studio-api.suno.ai".to_string()
    }

    fn default_model() -> String {
        "chirp-v3-5".to_string()
    }

    fn default_user_agent() -> String {
        "Mozilla/5.0".to_string()
    }

    fn default_request_timeout_secs() -> u64 {
        60
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            user_agent: Self::default_user_agent(),
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }
}

/// Job polling cadence.
///
/// The interval is fixed; there is no backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between status queries, in milliseconds.
    /// Default: 5000
    #[serde(default = "PollingConfig::default_interval_ms")]
    pub interval_ms: u64,

    /// Overall bound on waiting for a job, in seconds.
    /// Default: 300
    #[serde(default = "PollingConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl PollingConfig {
    fn default_interval_ms() -> u64 {
        5000
    }

    fn default_timeout_secs() -> u64 {
        300
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: Self::default_interval_ms(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Network bind address for `croon serve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindConfig {
    /// Default: 127.0.0.1
    #[serde(default = "BindConfig::default_host")]
    pub host: String,

    /// Default: 8000
    #[serde(default = "BindConfig::default_http_port")]
    pub http_port: u16,
}

impl BindConfig {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_http_port() -> u16 {
        8000
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            http_port: Self::default_http_port(),
        }
    }
}

/// Telemetry and observability configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive (trace, debug, info, warn, error, or an EnvFilter string).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,

    /// OTLP gRPC endpoint. Export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            otlp_endpoint: None,
        }
    }
}
