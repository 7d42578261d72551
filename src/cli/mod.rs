//! CLI module
//!
//! Command-line interface and HTTP server over the search engine.
//!
//! # Commands
//!
//! - `search` - Run one search and print the JSON result
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::Runner;
pub use server::{router, serve, SearchResponse, ServerConfig};
