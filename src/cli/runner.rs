//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::cli::server::{SearchResponse, ServerConfig};
use crate::config::{load_config, SearchConfig};
use crate::engine::SearchEngine;
use crate::error::{Error, Result};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let engine = SearchEngine::new(self.load_config()?)?;

        match &self.cli.command {
            Commands::Search { term, pretty } => self.search(&engine, term, *pretty).await,
            Commands::Serve { port, host } => {
                let config = ServerConfig {
                    host: *host,
                    port: *port,
                };
                crate::cli::serve(config, engine).await
            }
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<SearchConfig> {
        match &self.cli.config {
            Some(path) => {
                info!("Loading search configuration from {}", path.display());
                load_config(path)
            }
            None => Ok(SearchConfig::default()),
        }
    }

    /// Run a single search and print the JSON result
    async fn search(&self, engine: &SearchEngine, term: &str, pretty: bool) -> Result<()> {
        if term.is_empty() {
            return Err(Error::invalid_value("term", "must not be empty"));
        }

        let outcome = engine.fetch(term).await;
        let failure = outcome.error().map(str::to_string);
        let (_, body) = SearchResponse::from_outcome(term, outcome);

        let output = if pretty {
            serde_json::to_string_pretty(&body)?
        } else {
            serde_json::to_string(&body)?
        };
        println!("{output}");

        match failure {
            Some(error) => Err(Error::Other(error)),
            None => Ok(()),
        }
    }
}
