//! Search API transport
//!
//! [`HttpTransport`] POSTs one JSON payload per page to the configured
//! endpoint and hands back the decoded body. It never retries on its own:
//! failures are classified and returned so the engine decides what is
//! recoverable.

use super::rate_limit::RateLimiter;
use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::pagination::SearchRequestPayload;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

/// Longest prefix of a response body kept in errors and logs
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// Request/response primitive consumed by the search engine
///
/// Implementations must classify failures as:
/// - [`Error::Timeout`] when the request exceeded `timeout`
/// - [`Error::HttpStatus`] for a non-2xx response
/// - [`Error::Connection`] for DNS, refused or reset connections
/// - [`Error::Decode`] when the body is not JSON
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a single page request and return the decoded JSON body
    async fn send(&self, payload: &SearchRequestPayload, timeout: Duration) -> Result<Value>;
}

/// reqwest-backed [`Transport`]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    rate_limiter: Option<RateLimiter>,
}

impl HttpTransport {
    /// Create a transport for the endpoint and headers in `config`
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(build_header_map(&config.headers)?)
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Create a transport around an existing client
    ///
    /// Headers already configured on `client` are kept; `config.headers`
    /// is not applied.
    pub fn with_client(client: Client, config: &SearchConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
        }
    }

    /// Endpoint all pages are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: &SearchRequestPayload, timeout: Duration) -> Result<Value> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = truncate_chars(&body, MAX_ERROR_BODY_CHARS);
            error!("Server responded {} on page {}: {}", status, payload.page, body);
            return Err(Error::http_status(status.as_u16(), body));
        }

        let text = response.text().await.map_err(|e| classify(e, timeout))?;

        serde_json::from_str(&text).map_err(|e| {
            error!(
                "Response for page {} is not JSON, body starts with: {}",
                payload.page,
                truncate_chars(&text, MAX_ERROR_BODY_CHARS)
            );
            Error::decode(e.to_string())
        })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Map a reqwest failure onto the transport error taxonomy
fn classify(e: reqwest::Error, timeout: Duration) -> Error {
    if e.is_timeout() {
        return Error::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        };
    }

    if e.is_decode() {
        return Error::decode(e.without_url().to_string());
    }

    debug!("Transport failure: {:?}", e);
    Error::connection(e.without_url().to_string())
}

fn build_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::invalid_value(format!("headers.{key}"), e.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_value(format!("headers.{key}"), e.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
