//! HTTP session configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HttpError;

/// Environment variable holding the base URL.
pub const BASE_URL_ENV: &str = "TETHER_BASE_URL";
/// Environment variable holding the request timeout in milliseconds.
pub const TIMEOUT_MS_ENV: &str = "TETHER_TIMEOUT_MS";
/// Environment variable holding the user agent.
pub const USER_AGENT_ENV: &str = "TETHER_USER_AGENT";

/// Configuration of an [`HttpSession`](crate::HttpSession).
///
/// Every field has a default, so partial configuration files deserialize:
///
/// ```
/// # use tether_http::SessionConfig;
/// let config: SessionConfig = serde_json::from_str(r#"{ "base_url": "https://api.example.com" }"#).unwrap();
/// assert_eq!(config.timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL every request path is resolved against.
    pub base_url: String,
    /// Per-request timeout in milliseconds. Expiry is a transport failure.
    pub timeout_ms: u64,
    /// Headers sent with every request.
    pub default_headers: BTreeMap<String, String>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            timeout_ms: 30_000,
            default_headers: BTreeMap::new(),
            user_agent: concat!("tether/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SessionConfig {
    /// Creates a configuration for `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads the configuration from `TETHER_*` environment variables, keeping
    /// defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Config`] if `TETHER_TIMEOUT_MS` is not a number.
    pub fn from_env() -> Result<Self, HttpError> {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var(TIMEOUT_MS_ENV) {
            config.timeout_ms = timeout
                .parse()
                .map_err(|_| HttpError::Config(format!("{TIMEOUT_MS_ENV} must be an integer, got `{timeout}`")))?;
        }
        if let Ok(user_agent) = std::env::var(USER_AGENT_ENV) {
            config.user_agent = user_agent;
        }
        Ok(config)
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Adds a default header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
