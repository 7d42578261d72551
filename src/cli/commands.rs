//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Catalog search aggregator
#[derive(Parser, Debug)]
#[command(name = "catalog-search")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Search configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every result page for a term and print the products as JSON
    Search {
        /// Search term
        term: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,
    },
}
