//! Search configuration
//!
//! Every value that stays fixed for the lifetime of an engine lives here:
//! the API endpoint, the request headers, the constant payload fields and
//! the timings of the fetch loop. A configuration is built once, either
//! from YAML or through [`SearchConfigBuilder`], and is never mutated by
//! the engine.

use crate::error::{Error, Result, ResultExt};
use crate::http::RateLimiterConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default search endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.vendas.gpa.digital/pa/search/search";

// ============================================================================
// Top-Level Search Config
// ============================================================================

/// Immutable configuration for a [`SearchEngine`](crate::engine::SearchEngine)
/// and its transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Search API endpoint (receives one POST per page)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Headers sent with every request
    #[serde(default = "default_headers")]
    pub headers: HashMap<String, String>,

    /// Constant payload fields
    #[serde(default)]
    pub payload: PayloadDefaults,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Pause between consecutive page requests, in milliseconds
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Pause before retrying a page that timed out, in milliseconds
    #[serde(default = "default_timeout_backoff_ms")]
    pub timeout_backoff_ms: u64,

    /// Consecutive timeouts tolerated on one page (`None` = retry forever)
    #[serde(default = "default_max_timeout_retries")]
    pub max_timeout_retries: Option<u32>,

    /// Transport-wide request ceiling, shared by concurrent searches
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            headers: default_headers(),
            payload: PayloadDefaults::default(),
            timeout_seconds: default_timeout_seconds(),
            page_delay_ms: default_page_delay_ms(),
            timeout_backoff_ms: default_timeout_backoff_ms(),
            max_timeout_retries: default_max_timeout_retries(),
            rate_limit: None,
        }
    }
}

impl SearchConfig {
    /// Create a new config builder
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Pause between pages
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Pause before a timeout retry
    pub fn timeout_backoff(&self) -> Duration {
        Duration::from_millis(self.timeout_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "endpoint",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(Error::invalid_value(
                "timeout_seconds",
                "must be greater than zero",
            ));
        }

        if self.payload.results_per_page == 0 {
            return Err(Error::invalid_value(
                "payload.results_per_page",
                "must be greater than zero",
            ));
        }

        if let Some(limit) = &self.rate_limit {
            if limit.requests_per_second == 0 {
                return Err(Error::invalid_value(
                    "rate_limit.requests_per_second",
                    "must be greater than zero",
                ));
            }
        }

        Ok(())
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_headers() -> HashMap<String, String> {
    [
        (
            "User-Agent",
            "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:136.0) Gecko/20100101 Firefox/136.0",
        ),
        ("Accept", "application/json, text/plain, */*"),
        ("Accept-Language", "pt-BR,pt;q=0.8,en-US;q=0.5,en;q=0.3"),
        ("Content-Type", "application/json"),
        ("Origin", "https://www.paodeacucar.com"),
        ("Referer", "https://www.paodeacucar.com/"),
        ("Sec-Fetch-Dest", "empty"),
        ("Sec-Fetch-Mode", "cors"),
        ("Sec-Fetch-Site", "cross-site"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_timeout_seconds() -> u64 {
    20
}

fn default_page_delay_ms() -> u64 {
    500
}

fn default_timeout_backoff_ms() -> u64 {
    5000
}

#[allow(clippy::unnecessary_wraps)]
fn default_max_timeout_retries() -> Option<u32> {
    Some(5)
}

// ============================================================================
// Payload Defaults
// ============================================================================

/// Payload fields that never change between pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayloadDefaults {
    /// Sort mode
    #[serde(default = "default_sort_by")]
    pub sort_by: String,

    /// Page size the API uses to compute `totalPages`
    #[serde(default = "default_results_per_page")]
    pub results_per_page: u32,

    #[serde(default = "default_true")]
    pub allow_redirect: bool,

    /// Store identifier
    #[serde(default = "default_store_id")]
    pub store_id: u32,

    /// Sales channel
    #[serde(default = "default_department")]
    pub department: String,

    #[serde(default = "default_true")]
    pub customer_plus: bool,

    #[serde(default = "default_partner")]
    pub partner: String,
}

impl Default for PayloadDefaults {
    fn default() -> Self {
        Self {
            sort_by: default_sort_by(),
            results_per_page: default_results_per_page(),
            allow_redirect: true,
            store_id: default_store_id(),
            department: default_department(),
            customer_plus: true,
            partner: default_partner(),
        }
    }
}

fn default_sort_by() -> String {
    "relevance".to_string()
}

fn default_results_per_page() -> u32 {
    8
}

fn default_true() -> bool {
    true
}

fn default_store_id() -> u32 {
    461
}

fn default_department() -> String {
    "ecom".to_string()
}

fn default_partner() -> String {
    "linx".to_string()
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`SearchConfig`]
#[derive(Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Set the endpoint
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    /// Add or replace a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    /// Set the payload defaults
    pub fn payload(mut self, payload: PayloadDefaults) -> Self {
        self.config.payload = payload;
        self
    }

    /// Set the request timeout (whole seconds)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_seconds = timeout.as_secs();
        self
    }

    /// Set the pause between pages
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.config.page_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the pause before a timeout retry
    pub fn timeout_backoff(mut self, backoff: Duration) -> Self {
        self.config.timeout_backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Bound consecutive timeout retries per page
    pub fn max_timeout_retries(mut self, retries: u32) -> Self {
        self.config.max_timeout_retries = Some(retries);
        self
    }

    /// Retry timed-out pages without limit
    pub fn unbounded_timeout_retries(mut self) -> Self {
        self.config.max_timeout_retries = None;
        self
    }

    /// Set a transport-wide rate limit
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Build the config
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load and validate a configuration from a YAML file
pub fn load_config(path: impl AsRef<Path>) -> Result<SearchConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    load_config_from_str(&content)
}

/// Load and validate a configuration from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<SearchConfig> {
    let config: SearchConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}
