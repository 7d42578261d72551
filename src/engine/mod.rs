//! Search engine module
//!
//! The paginated fetch loop.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SearchEngine` - Runs one search to completion over a [`Transport`]
//! - `SearchOutcome` - The single terminal result of a search
//! - `SearchStats` / `SearchReport` - Per-search counters
//!
//! Pages are fetched strictly one after another. Page 1 tells the engine
//! how many pages exist; a fixed pause separates consecutive requests, and
//! a timed-out page is retried in place after a backoff. Any other error
//! ends the search and discards what was collected.

mod types;

pub use types::{PageFailure, SearchOutcome, SearchReport, SearchStats, SearchWarning};

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::http::{HttpTransport, Transport};
use crate::pagination::{PageResponse, PaginationState, SearchRequestPayload};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Products collected by a finished fetch loop
type Collected = (PaginationState, Vec<SearchWarning>);

/// Paginated fetch engine
///
/// Immutable once built; share it behind an `Arc` to serve concurrent
/// searches. Each search owns its own [`PaginationState`].
#[derive(Clone)]
pub struct SearchEngine {
    /// Request/response primitive
    transport: Arc<dyn Transport>,
    /// Fixed configuration
    config: SearchConfig,
}

impl SearchEngine {
    /// Create an engine that talks HTTP to `config.endpoint`
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create an engine over any transport
    pub fn with_transport(config: SearchConfig, transport: Arc<dyn Transport>) -> Self {
        Self { transport, config }
    }

    /// Fetch every page for `search_term`
    ///
    /// The caller is responsible for rejecting empty terms.
    pub async fn fetch(&self, search_term: &str) -> SearchOutcome {
        self.fetch_with_cancel(search_term, &CancellationToken::new())
            .await
    }

    /// Fetch every page for `search_term`, stopping early if `cancel` fires
    pub async fn fetch_with_cancel(
        &self,
        search_term: &str,
        cancel: &CancellationToken,
    ) -> SearchOutcome {
        self.run(search_term, cancel).await.outcome
    }

    /// Run a search and return its outcome with statistics
    pub async fn run(&self, search_term: &str, cancel: &CancellationToken) -> SearchReport {
        let start = Instant::now();
        let mut stats = SearchStats::new();

        info!("Starting search for '{search_term}'");
        let result = self.paginate(search_term, cancel, &mut stats).await;
        stats.set_duration(start.elapsed().as_millis() as u64);

        let outcome = match result {
            Ok((state, warnings)) => {
                let outcome = SearchOutcome::success(state.into_products(), warnings);
                info!(
                    "Search for '{search_term}' completed: {} products in {} pages ({}ms)",
                    outcome.total_found().unwrap_or_default(),
                    stats.pages_fetched,
                    stats.duration_ms
                );
                outcome
            }
            Err(failure) => {
                error!("Search for '{search_term}' failed: {}", failure.error);
                SearchOutcome::failure(failure.to_string())
            }
        };

        SearchReport { outcome, stats }
    }

    async fn paginate(
        &self,
        search_term: &str,
        cancel: &CancellationToken,
        stats: &mut SearchStats,
    ) -> std::result::Result<Collected, PageFailure> {
        let mut state = PaginationState::new();
        let mut payload = SearchRequestPayload::new(&self.config.payload, search_term);
        let mut warnings = Vec::new();

        while state.has_more() {
            let page = state.current_page;
            payload.set_page(page);

            if state.is_milestone() {
                info!(
                    "Fetching page {page} of {} for '{search_term}'",
                    state.total_pages
                );
            } else {
                debug!(
                    "Fetching page {page} of {} for '{search_term}'",
                    state.total_pages
                );
            }

            let body = match self.send_page(&payload, cancel).await {
                Ok(body) => body,
                Err(e) if e.is_retryable() => {
                    let timeouts = state.record_timeout();
                    if let Some(max) = self.config.max_timeout_retries {
                        if timeouts > max {
                            return Err(PageFailure::new(page, e));
                        }
                    }
                    let backoff = self.config.timeout_backoff();
                    warn!("Timeout on page {page} (attempt {timeouts}), retrying in {backoff:?}");
                    stats.add_timeout_retry();
                    self.pause(backoff, cancel)
                        .await
                        .map_err(|e| PageFailure::new(page, e))?;
                    continue;
                }
                Err(e) => return Err(PageFailure::new(page, e)),
            };
            stats.add_page();

            let response = PageResponse::from_value(body).map_err(|e| PageFailure::new(page, e))?;

            if state.is_first_page() {
                state.discover(&response);
                info!(
                    "API reported {} products across {} pages",
                    state.total_products_reported, state.total_pages
                );
                if state.total_pages == 0 {
                    info!("No products found for '{search_term}'");
                    break;
                }
            }

            let added = state.record_page(response.into_products());
            if added == 0 {
                warn!("Page {page} returned no products although more were expected");
                warnings.push(SearchWarning::EmptyPage { page });
            } else {
                debug!(
                    "Added {added} products from page {page}, {} total",
                    state.collected.len()
                );
            }

            state.next_page();

            if state.has_more() {
                self.pause(self.config.page_delay(), cancel)
                    .await
                    .map_err(|e| PageFailure::new(state.current_page, e))?;
            }
        }

        if let Some((reported, collected)) = state.count_mismatch() {
            warn!("Collected {collected} products but the API reported {reported}");
            warnings.push(SearchWarning::CountMismatch {
                reported,
                collected,
            });
        }

        Ok((state, warnings))
    }

    /// Send one page request unless the search is cancelled first
    async fn send_page(
        &self,
        payload: &SearchRequestPayload,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = self.transport.send(payload, self.config.request_timeout()) => result,
        }
    }

    /// Sleep for `delay` unless the search is cancelled first
    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
