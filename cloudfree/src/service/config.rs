//! Connection settings for the imagery service.

use std::time::Duration;

/// Default service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://earthengine.googleapis.com/v1";

/// Default environment variable holding the bearer token.
pub const DEFAULT_TOKEN_ENV: &str = "CLOUDFREE_TOKEN";

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Connection settings for [`HttpImageService`](super::HttpImageService).
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Base URL, without trailing slash.
    pub endpoint: String,

    /// Cloud project the requests are billed to.
    pub project: String,

    /// Environment variable the bearer token is read from.
    pub token_env: String,

    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project: String::new(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    /// Create a configuration for the given project.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Default::default()
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the token environment variable.
    pub fn with_token_env(mut self, name: impl Into<String>) -> Self {
        self.token_env = name.into();
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.token_env, DEFAULT_TOKEN_ENV);
        assert_eq!(config.timeout.as_secs(), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_builder_trims_endpoint() {
        let config = ServiceConfig::new("my-project")
            .with_endpoint("http://localhost:8080/v1/")
            .with_timeout(Duration::from_secs(10));
        assert_eq!(config.endpoint, "http://localhost:8080/v1");
        assert_eq!(config.project, "my-project");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
