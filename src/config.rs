//! Runtime configuration loaded from environment variables.

use crate::error::{InsightGenError, Result};
use std::time::Duration;

/// Runtime configuration for the pipeline and its HTTP client.
///
/// Every knob comes from an `INSIGHT_`-prefixed environment variable;
/// unset or unparsable values fall back to the defaults below.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend API, e.g. `http://localhost:8000/api`.
    pub api_url: String,
    /// Per-request timeout for the stage calls, in seconds.
    pub http_timeout_secs: u64,
    /// Maximum number of rows shipped to the insight stage.
    pub max_preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".to_string(),
            http_timeout_secs: 30,
            max_preview_rows: 50,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `INSIGHT_API_URL`: backend base URL; a bare `host:port` gains an
    ///   `http://` prefix.
    /// - `INSIGHT_HTTP_TIMEOUT_SECS`: clamped to 1..=300.
    /// - `INSIGHT_MAX_PREVIEW_ROWS`: clamped to 1..=500.
    pub fn load_from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("INSIGHT_API_URL")
            && !url.trim().is_empty()
        {
            config.api_url = normalize_base_url(&url);
        }

        if let Some(timeout) = std::env::var("INSIGHT_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.http_timeout_secs = timeout.clamp(1, 300);
        }

        if let Some(rows) = std::env::var("INSIGHT_MAX_PREVIEW_ROWS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.max_preview_rows = rows.clamp(1, 500);
        }

        config
    }

    /// Override the base URL (CLI flag beats environment).
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = normalize_base_url(url);
        self
    }

    /// Build the User-Agent string
    pub fn user_agent(&self) -> String {
        format!("insightgen/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Create an HTTP client configured for the stage calls
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.http_timeout_secs))
            .user_agent(self.user_agent())
            .build()
            .map_err(|e| InsightGenError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })
    }
}

/// Ensure the base URL carries a scheme and no trailing slash.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_backend() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000/api");
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.max_preview_rows, 50);
    }

    #[test]
    fn normalize_adds_scheme_and_strips_trailing_slash() {
        assert_eq!(
            normalize_base_url("localhost:9000/api/"),
            "http://localhost:9000/api"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com/api"),
            "https://api.example.com/api"
        );
    }
}
