//! Client configuration.

use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend gateway (no trailing slash).
    pub api_url: String,
    /// Publishable API key, sent as the `apikey` header when present.
    pub anon_key: Option<String>,
    /// User access token for authenticated writes.
    pub access_token: Option<String>,
    /// Per-request deadline.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            api_url,
            anon_key: None,
            access_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_anon_key(mut self, key: impl Into<String>) -> Self {
        self.anon_key = Some(key.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalized() {
        let config = ClientConfig::new("https://db.binflow.app/");
        assert_eq!(config.api_url, "https://db.binflow.app");
    }
}
