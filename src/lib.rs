//! # catalog-search
//!
//! Fetches every result page of a catalog search API and aggregates them
//! into one ordered product list.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog_search::{SearchConfig, SearchEngine, SearchOutcome};
//!
//! #[tokio::main]
//! async fn main() -> catalog_search::Result<()> {
//!     let engine = SearchEngine::new(SearchConfig::default())?;
//!
//!     match engine.fetch("cafe").await {
//!         SearchOutcome::Success { total_found, .. } => println!("{total_found} products"),
//!         SearchOutcome::Failure { error } => eprintln!("{error}"),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │        Caller: HTTP server (/api/search) / CLI         │
//! │        term → SearchOutcome → 200 / 400 / 500          │
//! └────────────────────────────────────────────────────────┘
//!                            │
//! ┌──────────────────────────┴─────────────────────────────┐
//! │                      SearchEngine                      │
//! │  page 1 discovery · ordered accumulation · pacing      │
//! │  timeout retry in place · all-or-nothing failure       │
//! └────────────────────────────────────────────────────────┘
//!                            │
//! ┌──────────────────────────┴─────────────────────────────┐
//! │           Transport (HttpTransport / reqwest)          │
//! │  POST JSON · timeout · error classification · limiter  │
//! └────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Search configuration and YAML loading
pub mod config;

/// HTTP transport with rate limiting
pub mod http;

/// Request payload, page envelope and pagination state
pub mod pagination;

/// Paginated fetch engine
pub mod engine;

/// Command-line interface and HTTP server
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{load_config, load_config_from_str, PayloadDefaults, SearchConfig};
pub use engine::{SearchEngine, SearchOutcome, SearchReport, SearchStats, SearchWarning};
pub use error::{Error, Result};
pub use http::{HttpTransport, Transport};
pub use pagination::{PageResponse, PaginationState, Product, SearchRequestPayload};
