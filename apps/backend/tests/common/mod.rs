//! Common test utilities for integration tests.
//!
//! Tests run against the in-memory store; no external services or
//! environment variables are required.

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};

use revision_backend::store::{MemoryStore, RevisionStore};
use revision_backend::{app, AppState};
use revision_core::RevisionItem;

/// Test context wrapping a fresh state and router.
pub struct TestContext {
    pub state: AppState,
    router: Router,
}

impl TestContext {
    /// Context with no exam date configured.
    pub fn new() -> Self {
        Self::with_exam_date(None)
    }

    /// Context with a service-level exam date, as if set via EXAM_DATE.
    pub fn with_exam_date(exam_date: Option<DateTime<Utc>>) -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), exam_date);
        let router = app(state.clone());
        Self { state, router }
    }

    /// Router for use with axum-test.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Put an item directly into the store, bypassing the ingestion route.
    /// Useful for seeding overdue or partially-learned states.
    pub fn seed_item(&self, item: RevisionItem) {
        self.state
            .store
            .put_item(item)
            .expect("in-memory store never fails");
    }
}
