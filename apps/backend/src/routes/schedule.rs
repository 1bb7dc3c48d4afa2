//! Schedule construction endpoint

use std::collections::HashSet;

use axum::{extract::State, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::AppState;
use revision_core::ScheduleBuilder;

/// POST /api/schedule
///
/// Read-only over the learner's items: builds the day's sessions plus
/// catch-up sessions for missed items that did not fit regular capacity.
pub async fn build(
    State(state): State<AppState>,
    Json(payload): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>> {
    let date = payload.date.unwrap_or_else(Utc::now);
    let mut preferences = payload.preferences.unwrap_or_default();
    if preferences.exam_date.is_none() {
        preferences.exam_date = state.exam_date;
    }

    let items = state.store.list_items(payload.learner_id)?;
    let builder = ScheduleBuilder::default();
    let sessions = builder.build_daily_schedule(&items, date, &preferences);

    let placed: HashSet<Uuid> = sessions
        .iter()
        .flat_map(|s| s.ordered_item_ids.iter().copied())
        .collect();
    let missed: Vec<RevisionItem> = items
        .into_iter()
        .filter(|item| item.overdue_days(date) >= 1 && !placed.contains(&item.item_id))
        .collect();
    let catch_up_sessions = builder.recover_missed(&missed, &sessions, date);

    tracing::debug!(
        learner_id = %payload.learner_id,
        sessions = sessions.len(),
        catch_up = catch_up_sessions.len(),
        "schedule built"
    );

    Ok(Json(ScheduleResponse {
        sessions,
        catch_up_sessions,
    }))
}
