pub mod error;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::store::{ItemLocks, MemoryStore, RevisionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RevisionStore>,
    pub locks: Arc<ItemLocks>,
    /// Externally supplied exam date; per-request values override it.
    pub exam_date: Option<DateTime<Utc>>,
}

impl AppState {
    pub fn new(store: Arc<dyn RevisionStore>, exam_date: Option<DateTime<Utc>>) -> Self {
        Self {
            store,
            locks: Arc::new(ItemLocks::new()),
            exam_date,
        }
    }
}

/// Build the full router over the given state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Item routes
        .route("/api/items", post(routes::items::create))
        .route("/api/items/due", get(routes::items::due))
        .route("/api/items/:item_id/forgetting", get(routes::insights::forgetting))
        // Review routes
        .route("/api/reviews", post(routes::review::submit))
        // Schedule routes
        .route("/api/schedule", post(routes::schedule::build))
        // Insight routes
        .route("/api/readiness", get(routes::insights::readiness))
        .route("/api/learners/:learner_id/stats", get(routes::insights::stats))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let exam_date = exam_date_from_env();
    if let Some(exam) = exam_date {
        tracing::info!(%exam, "exam date configured");
    }

    tracing::info!("Using in-memory revision store");
    let state = AppState::new(Arc::new(MemoryStore::new()), exam_date);

    let app = app(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// EXAM_DATE env var, RFC 3339. Unparseable values are logged and ignored
/// rather than taking the service down.
fn exam_date_from_env() -> Option<DateTime<Utc>> {
    let raw = std::env::var("EXAM_DATE").ok()?;
    match raw.parse::<DateTime<Utc>>() {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::warn!(%raw, %err, "ignoring unparseable EXAM_DATE");
            None
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
