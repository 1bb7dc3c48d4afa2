//! Item ingestion and due-item endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// POST /api/items
///
/// Called by the content-ingestion collaborator. The created item is due
/// immediately.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<Json<RevisionItem>> {
    let item = payload.into_item(Utc::now());
    state.store.put_item(item.clone())?;
    tracing::info!(
        item_id = %item.item_id,
        owner_id = %item.owner_id,
        subject = %item.subject,
        "item created"
    );
    Ok(Json(item))
}

/// GET /api/items/due
pub async fn due(
    State(state): State<AppState>,
    Query(query): Query<DueItemsQuery>,
) -> Result<Json<DueItemsResponse>> {
    let as_of = query.as_of.unwrap_or_else(Utc::now);
    let mut items: Vec<RevisionItem> = state
        .store
        .list_items(query.learner_id)?
        .into_iter()
        .filter(|item| item.is_due(as_of))
        .collect();
    // Most overdue first, stable across calls.
    items.sort_by(|a, b| a.next_due_at.cmp(&b.next_due_at).then(a.item_id.cmp(&b.item_id)));
    Ok(Json(DueItemsResponse { items }))
}
