//! Review submission endpoint

use axum::{extract::State, Json};
use chrono::Utc;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;
use revision_core::{DifficultyAdapter, IntervalScheduler, DECISION_WINDOW};

/// POST /api/reviews
///
/// Applies exactly one state transition: adapter decides the tier, the
/// scheduler computes the new interval/ease state, the updated item is
/// persisted and one snapshot appended. Submissions for the same item
/// serialize on a per-item lock; nothing is written when validation fails.
pub async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<Json<SubmitReviewResponse>> {
    let event = ReviewEvent {
        rating: payload.rating,
        confidence: payload.confidence,
        time_spent_seconds: payload.time_spent_seconds,
        hints_used: payload.hints_used.unwrap_or(0),
    };
    event.validate()?;

    let lock = state.locks.lock_for(payload.learner_id, payload.item_id);
    let _guard = lock.lock().await;

    let item = state
        .store
        .get_item(payload.learner_id, payload.item_id)?
        .ok_or_else(|| ApiError::NotFound(format!("item {}", payload.item_id)))?;

    let now = Utc::now();
    let history =
        state
            .store
            .recent_snapshots(payload.learner_id, payload.item_id, DECISION_WINDOW - 1)?;
    let previous_streak = history.last().map(|s| s.streak_at_time).unwrap_or(0);
    let streak = if event.rating.is_recall_success() {
        previous_streak + 1
    } else {
        0
    };
    let snapshot = PerformanceSnapshot::from_event(
        &event,
        item.difficulty_tier,
        streak,
        payload.context_tag.unwrap_or_else(|| "review".to_string()),
        now,
    );

    let mut window = history;
    window.push(snapshot.clone());

    let adapter = DifficultyAdapter::default();
    let decision = adapter.decide(&window, item.difficulty_tier);
    let retuned = item.with_difficulty_tier(decision.next_tier);

    let scheduler = IntervalScheduler::with_exam_date(state.exam_date);
    let outcome = scheduler.compute_next_state(&retuned, &event, now)?;
    let updated = retuned.apply_review(&outcome, &event);

    state.store.put_item(updated.clone())?;
    state
        .store
        .append_snapshot(payload.learner_id, payload.item_id, snapshot)?;

    let preview_intervals = scheduler.preview_intervals(&updated, now)?;

    tracing::info!(
        item_id = %updated.item_id,
        rating = ?event.rating,
        interval_days = updated.interval_days,
        ease_factor = updated.ease_factor,
        tier = updated.difficulty_tier.as_str(),
        "review applied"
    );

    Ok(Json(SubmitReviewResponse {
        item: updated,
        tier_decision: decision,
        preview_intervals,
    }))
}
