//! Tests for engine module

use super::*;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::time::Instant as TokioInstant;

// ============================================================================
// Test transports
// ============================================================================

/// Replays a fixed sequence of responses and records every request
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Value>>>,
    requests: Mutex<Vec<(TokioInstant, SearchRequestPayload)>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<Value>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn pages_requested(&self) -> Vec<u64> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| payload.page)
            .collect()
    }

    fn request_times(&self) -> Vec<TokioInstant> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, payload: &SearchRequestPayload, _timeout: Duration) -> Result<Value> {
        self.requests
            .lock()
            .unwrap()
            .push((TokioInstant::now(), payload.clone()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other("script exhausted".to_string())))
    }
}

/// Serves pages by number without consuming them
struct PagedTransport {
    pages: HashMap<u64, Value>,
}

#[async_trait]
impl Transport for PagedTransport {
    async fn send(&self, payload: &SearchRequestPayload, _timeout: Duration) -> Result<Value> {
        self.pages
            .get(&payload.page)
            .cloned()
            .ok_or_else(|| Error::http_status(404, "no such page"))
    }
}

/// Never answers
struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn send(&self, _payload: &SearchRequestPayload, _timeout: Duration) -> Result<Value> {
        std::future::pending().await
    }
}

fn products(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"sku": format!("{prefix}-{i}"), "name": format!("Product {i}")}))
        .collect()
}

fn page(total_pages: u64, total_products: u64, items: &[Value]) -> Result<Value> {
    Ok(json!({
        "totalPages": total_pages,
        "totalProducts": total_products,
        "products": items
    }))
}

fn engine(transport: Arc<dyn Transport>) -> SearchEngine {
    SearchEngine::with_transport(SearchConfig::default(), transport)
}

// ============================================================================
// Outcome Tests
// ============================================================================

#[test]
fn test_outcome_success_counts_products() {
    let outcome = SearchOutcome::success(vec![json!(1), json!(2)], Vec::new());
    assert!(outcome.is_success());
    assert_eq!(outcome.total_found(), Some(2));
    assert_eq!(outcome.products().map(<[Value]>::len), Some(2));
    assert!(outcome.error().is_none());
}

#[test]
fn test_outcome_failure_has_no_products() {
    let outcome = SearchOutcome::failure("boom");
    assert!(!outcome.is_success());
    assert_eq!(outcome.total_found(), None);
    assert!(outcome.products().is_none());
    assert!(outcome.warnings().is_empty());
    assert_eq!(outcome.error(), Some("boom"));
}

#[test]
fn test_page_failure_messages() {
    let cases = [
        (Error::http_status(503, "busy"), "HTTP error 503 on page 2"),
        (
            Error::connection("connection refused"),
            "Request error on page 2: connection refused",
        ),
        (
            Error::decode("expected value"),
            "Invalid response on page 2",
        ),
        (Error::Cancelled, "Search cancelled on page 2"),
        (
            Error::Other("kaput".to_string()),
            "Unexpected error on page 2: kaput",
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(PageFailure::new(2, error).to_string(), expected);
    }

    let timeout = PageFailure::new(4, Error::Timeout { timeout_ms: 20000 }).to_string();
    assert!(timeout.starts_with("Timed out on page 4"));
}

#[test]
fn test_warning_display() {
    let warning = SearchWarning::CountMismatch {
        reported: 20,
        collected: 19,
    };
    assert_eq!(
        warning.to_string(),
        "collected 19 products but the API reported 20"
    );
    assert_eq!(
        SearchWarning::EmptyPage { page: 3 }.to_string(),
        "page 3 returned no products"
    );
}

// ============================================================================
// Fetch loop Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_fetch_empty_result() {
    let transport = ScriptedTransport::new(vec![page(0, 0, &[])]);
    let outcome = engine(transport.clone()).fetch("xyzqwerty").await;

    assert_eq!(outcome, SearchOutcome::success(Vec::new(), Vec::new()));
    assert_eq!(transport.pages_requested(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_zero_pages_ignores_first_page_products() {
    let transport = ScriptedTransport::new(vec![page(0, 0, &products("a", 2))]);
    let outcome = engine(transport.clone()).fetch("cafe").await;

    assert_eq!(outcome.total_found(), Some(0));
    assert_eq!(transport.pages_requested(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_single_page() {
    let items = products("p1", 5);
    let transport = ScriptedTransport::new(vec![page(1, 5, &items)]);

    let start = TokioInstant::now();
    let outcome = engine(transport.clone()).fetch("cafe").await;

    assert_eq!(outcome, SearchOutcome::success(items, Vec::new()));
    assert_eq!(transport.pages_requested(), vec![1]);
    // No trailing pause after the last page
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_multi_page_aggregates_in_order() {
    let p1 = products("p1", 8);
    let p2 = products("p2", 8);
    let p3 = products("p3", 3);
    let transport = ScriptedTransport::new(vec![
        page(3, 19, &p1),
        page(3, 19, &p2),
        page(3, 19, &p3),
    ]);

    let outcome = engine(transport.clone()).fetch("cafe").await;

    let expected: Vec<Value> = [p1, p2, p3].concat();
    assert_eq!(outcome, SearchOutcome::success(expected, Vec::new()));
    assert_eq!(transport.pages_requested(), vec![1, 2, 3]);

    let times = transport.request_times();
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(500));
    }
}

#[tokio::test(start_paused = true)]
async fn test_fetch_later_pages_do_not_change_totals() {
    let transport = ScriptedTransport::new(vec![
        page(2, 2, &products("p1", 1)),
        page(9, 99, &products("p2", 1)),
    ]);

    let outcome = engine(transport.clone()).fetch("cafe").await;

    assert_eq!(outcome.total_found(), Some(2));
    assert!(outcome.warnings().is_empty());
    assert_eq!(transport.pages_requested(), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_http_failure_mid_pagination_discards_partial() {
    let transport = ScriptedTransport::new(vec![
        page(3, 24, &products("p1", 8)),
        Err(Error::http_status(503, "Service Unavailable")),
        page(3, 24, &products("p3", 8)),
    ]);

    let outcome = engine(transport.clone()).fetch("cafe").await;

    assert_eq!(
        outcome,
        SearchOutcome::failure("HTTP error 503 on page 2")
    );
    assert!(outcome.products().is_none());
    assert_eq!(transport.pages_requested(), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_connection_error_is_fatal() {
    let transport =
        ScriptedTransport::new(vec![Err(Error::connection("connection refused"))]);

    let outcome = engine(transport.clone()).fetch("cafe").await;

    assert_eq!(
        outcome.error(),
        Some("Request error on page 1: connection refused")
    );
    assert_eq!(transport.pages_requested(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_malformed_page_is_fatal() {
    let transport = ScriptedTransport::new(vec![
        page(2, 10, &products("p1", 8)),
        Ok(json!(["not", "an", "envelope"])),
    ]);

    let outcome = engine(transport).fetch("cafe").await;

    assert_eq!(
        outcome.error(),
        Some("Invalid response on page 2")
    );
}

#[tokio::test(start_paused = true)]
async fn test_fetch_timeout_retries_same_page() {
    let items = products("p1", 4);
    let transport = ScriptedTransport::new(vec![
        Err(Error::Timeout { timeout_ms: 20000 }),
        page(1, 4, &items),
    ]);

    let start = TokioInstant::now();
    let report = engine(transport.clone())
        .run("cafe", &CancellationToken::new())
        .await;

    assert_eq!(report.outcome, SearchOutcome::success(items, Vec::new()));
    assert_eq!(transport.pages_requested(), vec![1, 1]);
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert_eq!(report.stats.timeout_retries, 1);
    assert_eq!(report.stats.pages_fetched, 1);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_timeout_mid_pagination_keeps_progress() {
    let p1 = products("p1", 8);
    let p2 = products("p2", 2);
    let transport = ScriptedTransport::new(vec![
        page(2, 10, &p1),
        Err(Error::Timeout { timeout_ms: 20000 }),
        Err(Error::Timeout { timeout_ms: 20000 }),
        page(2, 10, &p2),
    ]);

    let outcome = engine(transport.clone()).fetch("cafe").await;

    assert_eq!(outcome, SearchOutcome::success([p1, p2].concat(), Vec::new()));
    assert_eq!(transport.pages_requested(), vec![1, 2, 2, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_timeout_retries_are_bounded() {
    let config = SearchConfig::builder().max_timeout_retries(2).build();
    let transport = ScriptedTransport::new(
        (0..5)
            .map(|_| Err(Error::Timeout { timeout_ms: 20000 }))
            .collect(),
    );

    let outcome = SearchEngine::with_transport(config, transport.clone())
        .fetch("cafe")
        .await;

    assert!(outcome.error().unwrap().starts_with("Timed out on page 1"));
    // One attempt plus two retries
    assert_eq!(transport.pages_requested(), vec![1, 1, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_unbounded_retries_keep_going() {
    let config = SearchConfig::builder().unbounded_timeout_retries().build();
    let mut script: Vec<Result<Value>> = (0..12)
        .map(|_| Err(Error::Timeout { timeout_ms: 20000 }))
        .collect();
    script.push(page(1, 1, &products("p1", 1)));
    let transport = ScriptedTransport::new(script);

    let outcome = SearchEngine::with_transport(config, transport.clone())
        .fetch("cafe")
        .await;

    assert_eq!(outcome.total_found(), Some(1));
    assert_eq!(transport.pages_requested().len(), 13);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_count_mismatch_is_a_warning() {
    let p1 = products("p1", 8);
    let p2 = products("p2", 8);
    let p3 = products("p3", 3);
    let transport = ScriptedTransport::new(vec![
        page(3, 20, &p1),
        page(3, 20, &p2),
        page(3, 20, &p3),
    ]);

    let outcome = engine(transport).fetch("cafe").await;

    assert_eq!(outcome.total_found(), Some(19));
    assert_eq!(
        outcome.warnings(),
        &[SearchWarning::CountMismatch {
            reported: 20,
            collected: 19
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_fetch_empty_middle_page_continues() {
    let p1 = products("p1", 8);
    let p3 = products("p3", 2);
    let transport = ScriptedTransport::new(vec![
        page(3, 10, &p1),
        Ok(json!({"totalPages": 3, "products": null})),
        page(3, 10, &p3),
    ]);

    let outcome = engine(transport.clone()).fetch("cafe").await;

    assert_eq!(outcome.total_found(), Some(10));
    assert_eq!(outcome.warnings(), &[SearchWarning::EmptyPage { page: 2 }]);
    assert_eq!(transport.pages_requested(), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_sends_term_and_fixed_fields() {
    let transport = ScriptedTransport::new(vec![
        page(2, 2, &products("p1", 1)),
        page(2, 2, &products("p2", 1)),
    ]);

    engine(transport.clone()).fetch("pão de queijo").await;

    let requests = transport.requests.lock().unwrap();
    let defaults = SearchConfig::default().payload;
    for (index, (_, payload)) in requests.iter().enumerate() {
        let mut expected = SearchRequestPayload::new(&defaults, "pão de queijo");
        expected.set_page(index as u64 + 1);
        assert_eq!(payload, &expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_fetch_is_idempotent() {
    let mut pages = HashMap::new();
    pages.insert(1, page(2, 12, &products("p1", 8)).unwrap());
    pages.insert(2, page(2, 12, &products("p2", 4)).unwrap());
    let engine = engine(Arc::new(PagedTransport { pages }));

    let first = engine.fetch("cafe").await;
    let second = engine.fetch("cafe").await;

    assert!(first.is_success());
    assert_eq!(first, second);
}

// ============================================================================
// Cancellation Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_fetch_cancelled_before_start() {
    let transport = ScriptedTransport::new(vec![page(1, 1, &products("p1", 1))]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = engine(transport.clone())
        .fetch_with_cancel("cafe", &cancel)
        .await;

    assert_eq!(outcome.error(), Some("Search cancelled on page 1"));
    assert!(transport.pages_requested().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fetch_cancelled_during_page_delay() {
    let transport = ScriptedTransport::new(vec![
        page(3, 24, &products("p1", 8)),
        page(3, 24, &products("p2", 8)),
        page(3, 24, &products("p3", 8)),
    ]);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let outcome = engine(transport.clone())
        .fetch_with_cancel("cafe", &cancel)
        .await;

    assert_eq!(outcome.error(), Some("Search cancelled on page 2"));
    assert_eq!(transport.pages_requested(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_cancelled_during_request() {
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let outcome = engine(Arc::new(HangingTransport))
        .fetch_with_cancel("cafe", &cancel)
        .await;

    assert_eq!(outcome, SearchOutcome::failure("Search cancelled on page 1"));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_cancelled_during_timeout_backoff() {
    let transport = ScriptedTransport::new(vec![
        Err(Error::Timeout { timeout_ms: 20000 }),
        page(1, 1, &products("p1", 1)),
    ]);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let start = TokioInstant::now();
    let outcome = engine(transport.clone())
        .fetch_with_cancel("cafe", &cancel)
        .await;

    assert_eq!(outcome.error(), Some("Search cancelled on page 1"));
    assert_eq!(transport.pages_requested(), vec![1]);
    assert!(start.elapsed() < Duration::from_secs(5));
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_concurrent_searches_are_independent() {
    let mut pages = HashMap::new();
    pages.insert(1, page(2, 3, &products("p1", 2)).unwrap());
    pages.insert(2, page(2, 3, &products("p2", 1)).unwrap());
    let engine = Arc::new(engine(Arc::new(PagedTransport { pages })));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.fetch("cafe").await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().total_found(), Some(3));
    }
}
