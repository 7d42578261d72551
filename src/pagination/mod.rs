//! Pagination module
//!
//! Page-number pagination with page-count discovery.
//!
//! # Overview
//!
//! The search API answers every page with the same envelope, but only the
//! first page's `totalPages`/`totalProducts` are authoritative. This module
//! holds the per-page request payload, the decoded page envelope, and the
//! state a single search carries through its fetch loop.

mod types;

pub use types::{PageResponse, PaginationState, Product, SearchRequestPayload};
