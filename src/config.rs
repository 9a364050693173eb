//! Client configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: Timeouts,
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_owned(), timeouts: Timeouts::default(), token: None }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `PHONESHOP_BASE_URL`: default `http://localhost:8001`
    /// - `PHONESHOP_REQUEST_TIMEOUT_SECS`: default 60
    /// - `PHONESHOP_CONNECT_TIMEOUT_SECS`: default 10
    /// - `PHONESHOP_TOKEN`: bearer token from a previous login
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an `http(s)` URL or a timeout
    /// is set but not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(
            &std::env::var("PHONESHOP_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned()),
        )?;
        let timeouts = Timeouts {
            request_secs: env_parse_secs("PHONESHOP_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_secs("PHONESHOP_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let token = std::env::var("PHONESHOP_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(Self { base_url, timeouts, token })
    }

    /// Replace the base URL, applying the same validation as [`ClientConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not an `http(s)` URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(raw)?;
        Ok(self)
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::ConfigParse(format!("base URL must start with http:// or https://: {raw}")));
    }
    Ok(trimmed.to_owned())
}

fn env_parse_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::ConfigParse(format!("{key} must be a positive integer, got '{raw}'"))),
            Ok(v) => Ok(v),
        },
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
