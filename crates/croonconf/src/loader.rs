//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, CroonConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local), only those that exist.
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/croon/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("croon/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("croon.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Overlay the values present in a TOML file onto `config`.
pub fn apply_file(config: &mut CroonConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Overlay the values present in TOML text onto `config`.
///
/// Keys that are absent leave the existing value alone, so files layer
/// field-by-field rather than section-by-section. A key of the wrong type is
/// a parse error.
pub fn apply_toml(config: &mut CroonConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let file = TomlFile { table: &table, path };

    if let Some(v) = file.string("upstream", "base_url")? {
        config.upstream.base_url = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = file.string("upstream", "model")? {
        config.upstream.model = v.to_string();
    }
    if let Some(v) = file.string("upstream", "user_agent")? {
        config.upstream.user_agent = v.to_string();
    }
    if let Some(v) = file.integer("upstream", "request_timeout_secs")? {
        config.upstream.request_timeout_secs = v;
    }

    if let Some(v) = file.string("session", "cookie")? {
        config.session.cookie = Some(v.to_string());
    }
    if let Some(v) = file.string("session", "captcha_api_key")? {
        config.session.captcha_api_key = Some(v.to_string());
    }

    if let Some(v) = file.integer("polling", "interval_ms")? {
        config.polling.interval_ms = v;
    }
    if let Some(v) = file.integer("polling", "timeout_secs")? {
        config.polling.timeout_secs = v;
    }

    if let Some(v) = file.string("bind", "host")? {
        config.bind.host = v.to_string();
    }
    if let Some(v) = file.integer("bind", "http_port")? {
        config.bind.http_port = v;
    }

    if let Some(v) = file.string("telemetry", "log_level")? {
        config.telemetry.log_level = v.to_string();
    }
    if let Some(v) = file.string("telemetry", "otlp_endpoint")? {
        config.telemetry.otlp_endpoint = non_empty(v);
    }

    Ok(())
}

/// Typed access to `[section].key` values of one parsed file.
struct TomlFile<'a> {
    table: &'a toml::Table,
    path: &'a Path,
}

impl<'a> TomlFile<'a> {
    fn value(&self, section: &str, key: &str) -> Result<Option<&'a toml::Value>, ConfigError> {
        match self.table.get(section) {
            None => Ok(None),
            Some(toml::Value::Table(t)) => Ok(t.get(key)),
            Some(_) => Err(self.bad_value(section, None, "a table")),
        }
    }

    fn string(&self, section: &str, key: &str) -> Result<Option<&'a str>, ConfigError> {
        match self.value(section, key)? {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| self.bad_value(section, Some(key), "a string")),
        }
    }

    fn integer<T: TryFrom<i64>>(&self, section: &str, key: &str) -> Result<Option<T>, ConfigError> {
        match self.value(section, key)? {
            None => Ok(None),
            Some(v) => v
                .as_integer()
                .and_then(|n| T::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.bad_value(section, Some(key), "an integer in range")),
        }
    }

    fn bad_value(&self, section: &str, key: Option<&str>, expected: &str) -> ConfigError {
        let name = match key {
            Some(key) => format!("{}.{}", section, key),
            None => section.to_string(),
        };
        ConfigError::Parse {
            path: self.path.to_path_buf(),
            message: format!("{} must be {}", name, expected),
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut CroonConfig, sources: &mut ConfigSources) {
    apply_env_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup.
pub fn apply_env_from<F>(config: &mut CroonConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut take = |key: &str| {
        let value = lookup(key)?;
        sources.env_overrides.push(key.to_string());
        Some(value)
    };

    // Session credentials. An empty SUNO_COOKIE is kept as-is so that it
    // fails loudly instead of silently falling back to a file value.
    if let Some(v) = take("SUNO_COOKIE") {
        config.session.cookie = Some(v);
    }
    if let Some(v) = take("TWOCAPTCHA_API_KEY") {
        config.session.captcha_api_key = non_empty(&v);
    }
    if let Some(v) = take("TWOCAPTCHA_KEY") {
        config.session.captcha_api_key = non_empty(&v);
    }

    // Upstream
    if let Some(v) = take("SUNO_API_BASE_URL") {
        config.upstream.base_url = v.trim_end_matches('/').to_string();
    }
    // Legacy name
    if let Some(v) = take("DEFAULT_MODEL") {
        config.upstream.model = v;
    }
    if let Some(v) = take("CROON_MODEL") {
        config.upstream.model = v;
    }

    // Polling
    if let Some(v) = lookup("CROON_POLL_INTERVAL_MS") {
        if let Ok(ms) = v.parse() {
            config.polling.interval_ms = ms;
            sources.env_overrides.push("CROON_POLL_INTERVAL_MS".to_string());
        }
    }
    if let Some(v) = lookup("CROON_POLL_TIMEOUT_SECS") {
        if let Ok(secs) = v.parse() {
            config.polling.timeout_secs = secs;
            sources.env_overrides.push("CROON_POLL_TIMEOUT_SECS".to_string());
        }
    }

    // Bind
    if let Some(v) = lookup("CROON_HTTP_HOST") {
        config.bind.host = v;
        sources.env_overrides.push("CROON_HTTP_HOST".to_string());
    }
    if let Some(v) = lookup("CROON_HTTP_PORT") {
        if let Ok(port) = v.parse() {
            config.bind.http_port = port;
            sources.env_overrides.push("CROON_HTTP_PORT".to_string());
        }
    }

    // Telemetry
    if let Some(v) = lookup("CROON_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("CROON_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
    if let Some(v) = lookup("CROON_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = non_empty(&v);
        sources.env_overrides.push("CROON_OTLP_ENDPOINT".to_string());
    }
    // Also support standard OTEL env var
    if let Some(v) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = non_empty(&v);
        sources.env_overrides.push("OTEL_EXPORTER_OTLP_ENDPOINT".to_string());
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
