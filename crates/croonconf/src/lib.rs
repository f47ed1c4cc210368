//! Configuration loading for croon.
//!
//! Holds everything the server needs before the tool adapter is built: the
//! upstream endpoint, the session cookie, polling cadence, bind address and
//! telemetry settings.
//!
//! # Usage
//!
//! ```rust,no_run
//! use croonconf::CroonConfig;
//!
//! let config = CroonConfig::load().expect("Failed to load config");
//! let token = config.session_token().expect("SUNO_COOKIE is not set");
//! println!("Upstream: {}", config.upstream.base_url);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/croon/config.toml` (system)
//! 2. `~/.config/croon/config.toml` (user)
//! 3. `./croon.toml` (local override, or the `--config` path)
//! 4. Environment variables (`SUNO_COOKIE`, `CROON_*`, ...)
//!
//! # Example Config
//!
//! ```toml
//! [upstream]
//! base_url = "https://studio-api.suno.ai"
//! model = "chirp-v3-5"
//!
//! [session]
//! cookie = "__client=...; sid=..."
//!
//! [polling]
//! interval_ms = 5000
//! timeout_secs = 300
//!
//! [bind]
//! host = "127.0.0.1"
//! http_port = 8000
//!
//! [telemetry]
//! log_level = "info"
//! otlp_endpoint = "127.0.0.1:4317"
//! ```

pub mod infra;
pub mod loader;
pub mod session;

pub use infra::{BindConfig, PollingConfig, TelemetryConfig, UpstreamConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};
pub use session::{SessionConfig, SessionToken};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("No session cookie configured: set SUNO_COOKIE or [session].cookie")]
    MissingSessionToken,

    #[error("Session cookie is not usable as an HTTP header: {0}")]
    InvalidSessionToken(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete croon configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CroonConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub bind: BindConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl CroonConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with an optional explicit file, then apply env overrides.
    ///
    /// If `config_path` is provided, it takes precedence over the local
    /// `./croon.toml` override. System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = CroonConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::apply_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);
        config.validate()?;

        Ok((config, sources))
    }

    /// Check invariants that would otherwise surface as confusing runtime behavior.
    ///
    /// The session cookie is checked by [`CroonConfig::session_token`] instead,
    /// so `croon config` works without one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "polling.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.polling.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "polling.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.upstream.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upstream.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !self.upstream.base_url.starts_with("http://")
            && !self.upstream.base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "upstream.base_url must be an http(s) URL, got '{}'",
                self.upstream.base_url
            )));
        }
        Ok(())
    }

    /// The session token, or `MissingSessionToken` when none is configured.
    pub fn session_token(&self) -> Result<SessionToken, ConfigError> {
        match self.session.cookie.as_deref() {
            Some(cookie) => SessionToken::new(cookie),
            None => Err(ConfigError::MissingSessionToken),
        }
    }

    /// Serialize config to TOML string, with secrets redacted.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# croon configuration\n\n");

        output.push_str("[upstream]\n");
        output.push_str(&format!("base_url = \"{}\"\n", self.upstream.base_url));
        output.push_str(&format!("model = \"{}\"\n", self.upstream.model));
        output.push_str(&format!("user_agent = \"{}\"\n", self.upstream.user_agent));
        output.push_str(&format!(
            "request_timeout_secs = {}\n",
            self.upstream.request_timeout_secs
        ));

        output.push_str("\n[session]\n");
        output.push_str(&format!(
            "cookie = \"{}\"\n",
            redact(self.session.cookie.as_deref())
        ));
        output.push_str(&format!(
            "captcha_api_key = \"{}\"\n",
            redact(self.session.captcha_api_key.as_deref())
        ));

        output.push_str("\n[polling]\n");
        output.push_str(&format!("interval_ms = {}\n", self.polling.interval_ms));
        output.push_str(&format!("timeout_secs = {}\n", self.polling.timeout_secs));

        output.push_str("\n[bind]\n");
        output.push_str(&format!("host = \"{}\"\n", self.bind.host));
        output.push_str(&format!("http_port = {}\n", self.bind.http_port));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));
        match &self.telemetry.otlp_endpoint {
            Some(endpoint) => output.push_str(&format!("otlp_endpoint = \"{}\"\n", endpoint)),
            None => output.push_str("# otlp_endpoint = \"127.0.0.1:4317\"\n"),
        }

        output
    }
}

fn redact(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.trim().is_empty() => "<redacted>",
        _ => "",
    }
}
