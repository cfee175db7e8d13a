//! Transport seam and the reqwest-backed HTTP transport
//!
//! A [`Transport`] performs exactly one upstream call and reports the raw
//! outcome. It never classifies or retries; that is the gateway's job.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::config::{ConfigError, GatewayConfig};
use super::identity::{ApiRequest, Method};

/// Query parameter carrying the credential
const API_KEY_PARAM: &str = "api_key";

/// Raw response from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    /// 200 response with a JSON body
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Response with an arbitrary status and empty body
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Network-level failure: no HTTP status was received
#[derive(Debug, Clone, thiserror::Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

/// Performs one upstream call
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the raw response
    async fn send(&self, request: &ApiRequest) -> Result<TransportResponse, TransportError>;
}

/// HTTP transport that sends the credential as an `api_key` query parameter
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Build a transport with the configured base URL, credential and timeouts
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::with_client(client, config))
    }

    /// Build a transport around an existing reqwest client
    pub fn with_client(client: Client, config: &GatewayConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<TransportResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.endpoint);

        let mut query: Vec<(&str, &str)> = request
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        query.push((API_KEY_PARAM, self.api_key.as_str()));

        debug!(
            "Sending {} {} with {} params",
            request.method,
            url,
            request.params.len()
        );

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => {
                let builder = self.client.post(&url);
                match &request.body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
        };

        // without_url() keeps the api_key query parameter out of error messages
        let response = builder
            .query(&query)
            .send()
            .await
            .map_err(|e| TransportError(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.without_url().to_string()))?;

        Ok(TransportResponse { status, body })
    }
}
