//! Request description and deterministic cache identity

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP method of an upstream request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Logical upstream request: endpoint plus normalized parameters
///
/// Parameters live in a [`BTreeMap`] so that insertion order never affects
/// the derived [`RequestIdentity`]. The credential is added by the transport
/// and is not part of the request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Endpoint path relative to the base URL, with a leading slash
    pub endpoint: String,
    /// Query parameters
    pub params: BTreeMap<String, String>,
    /// JSON body for POST requests
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Create a request for `endpoint`
    pub fn new(method: Method, endpoint: impl AsRef<str>) -> Self {
        Self {
            method,
            endpoint: normalize_endpoint(endpoint.as_ref()),
            params: BTreeMap::new(),
            body: None,
        }
    }

    /// GET request for `endpoint`
    pub fn get(endpoint: impl AsRef<str>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    /// POST request for `endpoint` with a JSON body
    pub fn post(endpoint: impl AsRef<str>, body: Value) -> Self {
        let mut request = Self::new(Method::Post, endpoint);
        request.body = Some(body);
        request
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Add a query parameter when `value` is present
    pub fn param_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// First path segment, used as a low-cardinality label (e.g. `/campaigns`)
    pub fn resource(&self) -> &str {
        let trimmed = self.endpoint.trim_start_matches('/');
        let end = trimmed.find('/').unwrap_or(trimmed.len());
        &self.endpoint[..end + 1]
    }

    /// Deterministic identity used for cache and queue addressing
    pub fn identity(&self) -> RequestIdentity {
        // BTreeMap and serde_json::Value maps both serialize with sorted keys
        let params = serde_json::to_string(&self.params).unwrap_or_default();
        let mut key = format!("{} {} {}", self.method, self.endpoint, params);
        if let Some(body) = &self.body {
            key.push(' ');
            key.push_str(&body.to_string());
        }
        RequestIdentity(key)
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_matches('/');
    format!("/{trimmed}")
}

/// Cache and queue key derived from an [`ApiRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestIdentity(String);

impl RequestIdentity {
    /// Identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
