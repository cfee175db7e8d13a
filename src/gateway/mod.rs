//! Rate-limited request gateway
//!
//! Every upstream call made by this crate goes through a [`RequestGateway`].
//! The gateway owns three things:
//!
//! 1. **Response cache**: [`cache::ResponseCache`], consulted before and populated
//!    after every transport call
//! 2. **Request queue**: a single FIFO of pending calls drained by one loop at a
//!    fixed minimum interval ([`rate_limit::RateLimiter`])
//! 3. **Error classification**: transport outcomes are turned into an
//!    [`UpstreamError`] exactly once, here, and never reinterpreted by callers
//!
//! # Quick Start
//!
//! ```no_run
//! use campaign_exporter::gateway::{ApiRequest, GatewayConfig, RequestGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = RequestGateway::with_http(GatewayConfig::new(
//!     "https://server.example.com/api/v1",
//!     "secret-key",
//! ))?;
//!
//! let request = ApiRequest::get("/email-accounts")
//!     .param("offset", 0)
//!     .param("limit", 100);
//! let payload = gateway.request(request).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`cache`] - Time-boxed response cache with lazy expiry
//! - [`config`] - Gateway configuration and defaults
//! - [`identity`] - Request description and deterministic cache identity
//! - [`queue`] - The gateway itself: serialized queue and drain loop
//! - [`rate_limit`] - Minimum-interval dispatch throttle
//! - [`transport`] - Transport seam and the reqwest implementation

pub mod cache;
pub mod config;
pub mod identity;
pub mod queue;
pub mod rate_limit;
pub mod transport;

pub use cache::ResponseCache;
pub use config::{ConfigError, GatewayConfig};
pub use identity::{ApiRequest, Method, RequestIdentity};
pub use queue::RequestGateway;
pub use rate_limit::RateLimiter;
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};

use serde_json::Value;

/// Classified upstream failure
///
/// Produced once at the gateway boundary. Cloneable because a single
/// transport failure is delivered to every caller waiting on the same request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// HTTP 401
    #[error("authentication failed (HTTP 401): the API key is missing or invalid, check the configured credential")]
    AuthInvalid,

    /// HTTP 429
    #[error("rate limited by the campaign provider (HTTP 429)")]
    RateLimited,

    /// Any other non-2xx status
    #[error("campaign provider error (HTTP {status}): {message}")]
    ServerError {
        /// HTTP status code returned upstream
        status: u16,
        /// Short description of the status
        message: String,
    },

    /// Transport-level failure or an unreadable response
    #[error("request to campaign provider failed: {0}")]
    Unknown(String),

    /// Request was still queued when shutdown was requested
    #[error("request cancelled before dispatch")]
    Cancelled,
}

/// Coarse category of an [`UpstreamError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// Credential rejected
    AuthInvalid,
    /// Provider throttled the request
    RateLimited,
    /// Provider returned a non-2xx status
    ServerError,
    /// Network failure or unreadable response
    Unknown,
    /// Cancelled locally before dispatch
    Cancelled,
}

impl UpstreamError {
    /// Category of this error
    pub fn kind(&self) -> UpstreamErrorKind {
        match self {
            Self::AuthInvalid => UpstreamErrorKind::AuthInvalid,
            Self::RateLimited => UpstreamErrorKind::RateLimited,
            Self::ServerError { .. } => UpstreamErrorKind::ServerError,
            Self::Unknown(_) => UpstreamErrorKind::Unknown,
            Self::Cancelled => UpstreamErrorKind::Cancelled,
        }
    }

    /// HTTP status code associated with the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::AuthInvalid => Some(401),
            Self::RateLimited => Some(429),
            Self::ServerError { status, .. } => Some(*status),
            Self::Unknown(_) | Self::Cancelled => None,
        }
    }

    /// Metric label for the error category
    pub fn label(&self) -> &'static str {
        match self.kind() {
            UpstreamErrorKind::AuthInvalid => "auth_invalid",
            UpstreamErrorKind::RateLimited => "rate_limited",
            UpstreamErrorKind::ServerError => "server_error",
            UpstreamErrorKind::Unknown => "unknown",
            UpstreamErrorKind::Cancelled => "cancelled",
        }
    }
}

/// Map a non-2xx HTTP status to its [`UpstreamError`]
pub fn classify_status(status: u16) -> UpstreamError {
    match status {
        401 => UpstreamError::AuthInvalid,
        429 => UpstreamError::RateLimited,
        other => UpstreamError::ServerError {
            status: other,
            message: reqwest::StatusCode::from_u16(other)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("unexpected status")
                .to_string(),
        },
    }
}

/// Turn a raw transport response into a payload or a classified error
///
/// Raw error bodies are deliberately not carried into the error message.
pub fn classify_response(response: TransportResponse) -> Result<Value, UpstreamError> {
    if !(200..300).contains(&response.status) {
        return Err(classify_status(response.status));
    }

    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&response.body)
        .map_err(|e| UpstreamError::Unknown(format!("invalid JSON in response: {e}")))
}
