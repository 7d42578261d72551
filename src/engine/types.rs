//! Engine types
//!
//! Outcome, warning and statistics types returned by a search.

use crate::error::Error;
use crate::pagination::Product;
use serde::Serialize;

/// Terminal result of one search
///
/// There is no partial-success variant: a failure never carries products.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Every page was fetched
    Success {
        /// Always equal to `products.len()`
        total_found: usize,
        /// Products in page order
        products: Vec<Product>,
        /// Non-fatal conditions noticed along the way
        warnings: Vec<SearchWarning>,
    },
    /// The search stopped on a non-recoverable error
    Failure {
        /// Human-readable summary naming the failing page
        error: String,
    },
}

impl SearchOutcome {
    /// Create a success outcome
    pub fn success(products: Vec<Product>, warnings: Vec<SearchWarning>) -> Self {
        Self::Success {
            total_found: products.len(),
            products,
            warnings,
        }
    }

    /// Create a failure outcome
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Check if this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Number of products found, if successful
    pub fn total_found(&self) -> Option<usize> {
        match self {
            Self::Success { total_found, .. } => Some(*total_found),
            Self::Failure { .. } => None,
        }
    }

    /// Products found, if successful
    pub fn products(&self) -> Option<&[Product]> {
        match self {
            Self::Success { products, .. } => Some(products),
            Self::Failure { .. } => None,
        }
    }

    /// Warnings raised by a successful search
    pub fn warnings(&self) -> &[SearchWarning] {
        match self {
            Self::Success { warnings, .. } => warnings,
            Self::Failure { .. } => &[],
        }
    }

    /// Error message, if failed
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }
}

/// Non-fatal condition attached to a successful search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchWarning {
    /// Collected count differs from the total reported on page 1
    CountMismatch { reported: u64, collected: usize },
    /// A page inside the reported range returned no products
    EmptyPage { page: u64 },
}

impl std::fmt::Display for SearchWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CountMismatch {
                reported,
                collected,
            } => write!(
                f,
                "collected {collected} products but the API reported {reported}"
            ),
            Self::EmptyPage { page } => write!(f, "page {page} returned no products"),
        }
    }
}

/// A fatal error tied to the page it happened on
#[derive(Debug)]
pub struct PageFailure {
    /// Page being fetched when the search stopped
    pub page: u64,
    /// Underlying error
    pub error: Error,
}

impl PageFailure {
    /// Create a page failure
    pub fn new(page: u64, error: Error) -> Self {
        Self { page, error }
    }
}

impl std::fmt::Display for PageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let page = self.page;
        match &self.error {
            Error::Timeout { timeout_ms } => write!(
                f,
                "Timed out on page {page} (no response within {timeout_ms}ms, retries exhausted)"
            ),
            Error::HttpStatus { status, .. } => write!(f, "HTTP error {status} on page {page}"),
            Error::Connection { message } => {
                write!(f, "Request error on page {page}: {message}")
            }
            Error::Http(e) => write!(f, "Request error on page {page}: {e}"),
            Error::Decode { .. } | Error::JsonParse(_) => {
                write!(f, "Invalid response on page {page}")
            }
            Error::Cancelled => write!(f, "Search cancelled on page {page}"),
            other => write!(f, "Unexpected error on page {page}: {other}"),
        }
    }
}

/// Statistics from one search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Pages answered successfully
    pub pages_fetched: usize,
    /// Timeouts that were retried
    pub timeout_retries: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SearchStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a retried timeout
    pub fn add_timeout_retry(&mut self) {
        self.timeout_retries += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Outcome of a search together with its statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub stats: SearchStats,
}
