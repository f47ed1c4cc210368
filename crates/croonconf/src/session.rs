//! Session credentials.
//!
//! The upstream service authenticates with a browser session cookie. It is
//! read once at startup and never refreshed in-process: when it expires the
//! operator supplies a new value and restarts.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Raw credential values as loaded from files and environment.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Full `Cookie` header value copied from a logged-in browser session.
    #[serde(default)]
    pub cookie: Option<String>,

    /// Captcha-solving service key. Passed through, not used by the adapter.
    #[serde(default)]
    pub captcha_api_key: Option<String>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .field(
                "captcha_api_key",
                &self.captcha_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// The process-wide upstream credential.
///
/// Immutable once built; clones share the same allocation, so concurrent
/// readers never contend.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(Arc<str>);

impl SessionToken {
    /// Wrap a cookie string, rejecting empty or whitespace-only values.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ConfigError> {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            return Err(ConfigError::MissingSessionToken);
        }
        if raw.contains(['\r', '\n']) {
            return Err(ConfigError::InvalidSessionToken(
                "cookie contains a line break".to_string(),
            ));
        }
        Ok(Self(Arc::from(raw.trim())))
    }

    /// The cookie header value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}
