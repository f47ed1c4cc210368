//! Error taxonomy for song generation.
//!
//! Nothing here is retried automatically. Every failure reaches the caller,
//! because the usual causes (expired cookie, rate limits, content policy)
//! need a human.

use croonconf::ConfigError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SongError {
    /// Missing or unusable startup configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Bad caller input, rejected before any network call.
    #[error("invalid arguments: {0}")]
    Validation(String),

    /// The upstream rejected the session cookie.
    #[error(
        "upstream rejected the session cookie (HTTP {status}); \
         copy a fresh cookie from a logged-in browser into SUNO_COOKIE and restart croon"
    )]
    UpstreamAuth { status: u16 },

    /// Any other non-success exchange with the upstream.
    #[error("{}", upstream_message(.status, .message))]
    Upstream { status: Option<u16>, message: String },

    /// The job reached its terminal failed state.
    #[error("generation failed upstream: {0}")]
    GenerationFailed(String),

    /// The poll loop ran out of time. The job may still finish upstream.
    #[error("gave up waiting for job {job_id} after {}s", whole_secs(.waited))]
    Timeout { job_id: String, waited: Duration },
}

fn upstream_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("upstream returned HTTP {}: {}", code, message),
        None => format!("upstream request failed: {}", message),
    }
}

fn whole_secs(waited: &Duration) -> u64 {
    waited.as_secs()
}

impl SongError {
    pub fn validation(message: impl Into<String>) -> Self {
        SongError::Validation(message.into())
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        SongError::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Short machine-readable kind, used in logs and tool results.
    pub fn kind(&self) -> &'static str {
        match self {
            SongError::Configuration(_) => "configuration_error",
            SongError::Validation(_) => "validation_error",
            SongError::UpstreamAuth { .. } => "upstream_auth_error",
            SongError::Upstream { .. } => "upstream_error",
            SongError::GenerationFailed(_) => "upstream_generation_failed",
            SongError::Timeout { .. } => "timeout_error",
        }
    }
}

impl From<reqwest::Error> for SongError {
    fn from(err: reqwest::Error) -> Self {
        SongError::Upstream {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
