//! Platform API client configuration.

use std::time::Duration;

use crisiswire_core::defaults;

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the platform API, without a trailing slash.
    pub base_url: String,
    /// Bearer token sent on every request (None for anonymous access).
    pub auth_token: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_URL.to_string(),
            auth_token: None,
            timeout: Duration::from_secs(defaults::API_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CRISISWIRE_API_URL` | `http://127.0.0.1:3000` | Platform API base URL |
    /// | `CRISISWIRE_API_TOKEN` | unset | Bearer token |
    /// | `CRISISWIRE_API_TIMEOUT_SECS` | `30` | Request timeout |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CRISISWIRE_API_URL") {
            if !url.is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Ok(token) = std::env::var("CRISISWIRE_API_TOKEN") {
            if !token.is_empty() {
                config.auth_token = Some(token);
            }
        }
        if let Some(secs) = std::env::var("CRISISWIRE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Set the base URL (trailing slash is stripped).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url: String = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, defaults::API_URL);
        assert!(config.auth_token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn builders_strip_trailing_slash() {
        let config = ApiConfig::default()
            .with_base_url("https://api.example.org/")
            .with_auth_token("netrunnerX")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url, "https://api.example.org");
        assert_eq!(config.auth_token.as_deref(), Some("netrunnerX"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
