//! HTTP server mode for REST API access to the search engine

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::{SearchEngine, SearchOutcome};
use crate::error::{Error, Result};
use crate::pagination::Product;

const MISSING_TERM: &str = "Parameter 'term' is required.";
const INTERNAL_ERROR: &str = "Internal server error";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
}

/// App state shared across handlers
#[derive(Clone)]
struct AppState {
    engine: Arc<SearchEngine>,
}

/// Query string of the search endpoints
#[derive(Debug, Deserialize)]
struct SearchQuery {
    term: Option<String>,
}

/// Body returned by the search endpoints and the `search` command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_found: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    /// Map an engine outcome onto a status code and body
    pub fn from_outcome(term: impl Into<String>, outcome: SearchOutcome) -> (StatusCode, Self) {
        match outcome {
            SearchOutcome::Success {
                total_found,
                products,
                ..
            } => (
                StatusCode::OK,
                Self {
                    success: true,
                    term: Some(term.into()),
                    total_found: Some(total_found),
                    products: Some(products),
                    error: None,
                },
            ),
            SearchOutcome::Failure { error } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Self::error(error))
            }
        }
    }

    /// Create an error body
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            term: None,
            total_found: None,
            products: None,
            error: Some(msg.into()),
        }
    }
}

/// Build the application router
pub fn router(engine: Arc<SearchEngine>) -> Router {
    let state = AppState { engine };

    // Build CORS layer - allow all origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/search", get(search))
        .route("/api/search", get(search))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig, engine: SearchEngine) -> Result<()> {
    let app = router(Arc::new(engine));

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Run a search for `?term=`
async fn search(State(state): State<Arc<AppState>>, Query(query): Query<SearchQuery>) -> Response {
    let Some(term) = query.term.filter(|t| !t.is_empty()) else {
        tracing::warn!("Search request without 'term' parameter");
        return (StatusCode::BAD_REQUEST, Json(SearchResponse::error(MISSING_TERM)))
            .into_response();
    };

    tracing::info!("Search requested for '{term}'");

    // The engine runs in its own task so a panic there becomes a 500
    let engine = Arc::clone(&state.engine);
    let search_term = term.clone();
    let outcome = tokio::spawn(async move { engine.fetch(&search_term).await }).await;

    match outcome {
        Ok(outcome) => {
            match &outcome {
                SearchOutcome::Success { total_found, .. } => {
                    tracing::info!("Search for '{term}' returned {total_found} products");
                }
                SearchOutcome::Failure { error } => {
                    tracing::error!("Search for '{term}' failed: {error}");
                }
            }
            let (status, body) = SearchResponse::from_outcome(term, outcome);
            (status, Json(body)).into_response()
        }
        Err(e) => {
            tracing::error!("Search task for '{term}' aborted: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SearchResponse::error(INTERNAL_ERROR)),
            )
                .into_response()
        }
    }
}
