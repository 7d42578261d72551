//! Pagination types
//!
//! Request payload, page envelope and loop state.

use crate::config::PayloadDefaults;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A product record, forwarded verbatim
pub type Product = Value;

/// Body of one page request
///
/// Only `terms` and `page` vary within a search; everything else is copied
/// from [`PayloadDefaults`] once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequestPayload {
    pub terms: String,
    /// 1-based page number
    pub page: u64,
    pub sort_by: String,
    pub results_per_page: u32,
    pub allow_redirect: bool,
    pub store_id: u32,
    pub department: String,
    pub customer_plus: bool,
    pub partner: String,
}

impl SearchRequestPayload {
    /// Create the payload for page 1 of `terms`
    pub fn new(defaults: &PayloadDefaults, terms: impl Into<String>) -> Self {
        Self {
            terms: terms.into(),
            page: 1,
            sort_by: defaults.sort_by.clone(),
            results_per_page: defaults.results_per_page,
            allow_redirect: defaults.allow_redirect,
            store_id: defaults.store_id,
            department: defaults.department.clone(),
            customer_plus: defaults.customer_plus,
            partner: defaults.partner.clone(),
        }
    }

    /// Point the payload at another page
    pub fn set_page(&mut self, page: u64) {
        self.page = page;
    }
}

/// Decoded response for one page
///
/// Missing or `null` counters read as zero and a missing or `null` product
/// list reads as empty. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    #[serde(default)]
    total_pages: Option<u64>,
    #[serde(default)]
    total_products: Option<u64>,
    #[serde(default)]
    products: Option<Vec<Product>>,
}

impl PageResponse {
    /// Decode a page envelope from a JSON body
    pub fn from_value(body: Value) -> Result<Self> {
        serde_json::from_value(body)
            .map_err(|e| Error::decode(format!("unexpected page format: {e}")))
    }

    /// Total pages reported by the API
    pub fn total_pages(&self) -> u64 {
        self.total_pages.unwrap_or(0)
    }

    /// Total products reported by the API
    pub fn total_products(&self) -> u64 {
        self.total_products.unwrap_or(0)
    }

    /// Products on this page
    pub fn products(&self) -> &[Product] {
        self.products.as_deref().unwrap_or_default()
    }

    /// Take the products on this page
    pub fn into_products(self) -> Vec<Product> {
        self.products.unwrap_or_default()
    }
}

/// Mutable state of one search's fetch loop
///
/// Created fresh for every search and dropped when it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState {
    /// Page about to be fetched (1-based)
    pub current_page: u64,
    /// Page count; 1 until page 1 has been decoded
    pub total_pages: u64,
    /// Product count reported on page 1
    pub total_products_reported: u64,
    /// Products collected so far, in page order
    pub collected: Vec<Product>,
    /// Timeouts in a row on `current_page`
    pub consecutive_timeouts: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_products_reported: 0,
            collected: Vec::new(),
            consecutive_timeouts: 0,
        }
    }
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Are there pages left to fetch?
    pub fn has_more(&self) -> bool {
        self.current_page <= self.total_pages
    }

    /// Is the current page the one carrying pagination metadata?
    pub fn is_first_page(&self) -> bool {
        self.current_page == 1
    }

    /// Page 1, every tenth page and the last page
    pub fn is_milestone(&self) -> bool {
        self.current_page == 1
            || self.current_page % 10 == 0
            || self.current_page == self.total_pages
    }

    /// Take the authoritative totals from the first page
    pub fn discover(&mut self, first: &PageResponse) {
        self.total_pages = first.total_pages();
        self.total_products_reported = first.total_products();
    }

    /// Append a page's products, returning how many were added
    pub fn record_page(&mut self, products: Vec<Product>) -> usize {
        let added = products.len();
        self.collected.extend(products);
        self.consecutive_timeouts = 0;
        added
    }

    /// Count a timeout on the current page, returning the running total
    pub fn record_timeout(&mut self) -> u32 {
        self.consecutive_timeouts = self.consecutive_timeouts.saturating_add(1);
        self.consecutive_timeouts
    }

    /// Move on to the next page
    pub fn next_page(&mut self) {
        self.current_page += 1;
    }

    /// Does the collected count disagree with the reported total?
    ///
    /// A reported total of zero is treated as "not reported".
    pub fn count_mismatch(&self) -> Option<(u64, usize)> {
        let collected = self.collected.len();
        let reported = self.total_products_reported;
        (reported > 0 && reported != collected as u64).then_some((reported, collected))
    }

    /// Consume the state, yielding the collected products
    pub fn into_products(self) -> Vec<Product> {
        self.collected
    }
}
