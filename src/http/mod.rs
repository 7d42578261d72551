//! HTTP transport module
//!
//! Provides the [`Transport`] seam the search engine talks to, and its
//! reqwest-backed implementation.
//!
//! # Features
//!
//! - **Error Classification**: timeouts, HTTP status, connection and decode
//!   failures map onto distinct [`Error`](crate::error::Error) variants
//! - **Rate Limiting**: optional token bucket shared by every search that
//!   uses the same transport

mod client;
mod rate_limit;

pub use client::{HttpTransport, Transport, MAX_ERROR_BODY_CHARS};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
