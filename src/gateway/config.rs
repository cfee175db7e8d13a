//! Gateway configuration constants

use std::fmt;
use std::time::Duration;

/// Default provider base URL.
pub const DEFAULT_BASE_URL: &str = "https://server.smartlead.ai/api/v1";

/// Minimum delay between two upstream dispatches, in milliseconds.
/// 200ms keeps aggregate throughput at 5 requests/second, under the
/// provider's published limit of 10 requests per 2 seconds.
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 200;

/// How long a cached response stays valid, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// HTTP connect timeout (seconds) - time to establish TCP connection
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP request timeout (seconds) - overall time for the entire request
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Base URL is empty
    #[error("base URL must not be empty")]
    MissingBaseUrl,

    /// Base URL does not parse
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// Offending URL
        url: String,
        /// Parse failure
        reason: String,
    },

    /// API key is empty
    #[error("API key must not be empty (set CAMPAIGN_API_KEY or pass --api-key)")]
    MissingApiKey,

    /// Rate limit delay of zero would disable throttling
    #[error("rate limit delay must be greater than zero")]
    ZeroRateLimitDelay,

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Settings supplied to a [`super::RequestGateway`] at construction time
#[derive(Clone)]
pub struct GatewayConfig {
    /// Provider API base URL, without a trailing slash
    pub base_url: String,
    /// Static credential sent as the `api_key` query parameter
    pub api_key: String,
    /// Minimum interval between upstream dispatches
    pub rate_limit_delay: Duration,
    /// Lifetime of a cached response
    pub cache_ttl: Duration,
    /// TCP connect timeout of the HTTP transport
    pub connect_timeout: Duration,
    /// Whole-request timeout of the HTTP transport
    pub request_timeout: Duration,
}

impl GatewayConfig {
    /// Create a configuration with default throttling and caching
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            rate_limit_delay: Duration::from_millis(DEFAULT_RATE_LIMIT_DELAY_MS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            connect_timeout: Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Override the minimum inter-request interval
    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    /// Override the cache TTL
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Override the HTTP timeouts
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Check that the configuration can drive an HTTP gateway
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }

        reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        if self.rate_limit_delay.is_zero() {
            return Err(ConfigError::ZeroRateLimitDelay);
        }

        Ok(())
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("cache_ttl", &self.cache_ttl)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
