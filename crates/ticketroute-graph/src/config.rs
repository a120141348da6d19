//! Graph client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Graph v1.0 endpoint.
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Graph client configuration.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// API root; resource paths such as `me/mailFolders` are appended to it.
    pub base_url: Url,
    /// Timeout for a whole request, response body included.
    pub request_timeout: Duration,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Retry policy for `GET` requests.
    pub retry: RetryPolicy,
}

impl GraphConfig {
    /// Creates a configuration builder with defaults.
    #[must_use]
    pub fn builder() -> GraphConfigBuilder {
        GraphConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not HTTP(S), a timeout is zero,
    /// or the retry policy allows no attempt at all.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "base_url must be http or https, got {}",
                self.base_url.scheme()
            )));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig("base_url cannot be a base".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::InvalidConfig("request_timeout is zero".into()));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::InvalidConfig("connect_timeout is zero".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidConfig("retry.max_attempts is zero".into()));
        }
        Ok(())
    }
}

/// Builder for [`GraphConfig`].
#[derive(Debug, Clone)]
pub struct GraphConfigBuilder {
    base_url: String,
    request_timeout: Duration,
    connect_timeout: Duration,
    retry: RetryPolicy,
}

impl Default for GraphConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphConfigBuilder {
    /// Creates a builder pointing at the public Graph endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the API root (e.g. a national cloud endpoint).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the retry policy for `GET` requests.
    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the configuration
    /// is invalid.
    pub fn build(self) -> Result<GraphConfig> {
        let config = GraphConfig {
            base_url: Url::parse(&self.base_url)?,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            retry: self.retry,
        };
        config.validate()?;
        Ok(config)
    }
}
