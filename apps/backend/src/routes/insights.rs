//! Retention and readiness endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;
use revision_core::{MasteryLevel, RetentionModel};

/// GET /api/items/{item_id}/forgetting
///
/// Predicted retention at the fixed horizons (1h through 1 month).
pub async fn forgetting(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Query(query): Query<ForgettingQuery>,
) -> Result<Json<ForgettingResponse>> {
    let item = state
        .store
        .get_item(query.learner_id, item_id)?
        .ok_or_else(|| ApiError::NotFound(format!("item {item_id}")))?;

    let model = RetentionModel::default();
    Ok(Json(ForgettingResponse {
        item_id,
        points: model.forgetting_curve(&item),
    }))
}

/// GET /api/readiness
pub async fn readiness(
    State(state): State<AppState>,
    Query(query): Query<ReadinessQuery>,
) -> Result<Json<ReadinessResponse>> {
    let exam_date = query
        .exam_date
        .or(state.exam_date)
        .ok_or_else(|| ApiError::Configuration("no exam date configured".to_string()))?;

    let now = Utc::now();
    let items = state.store.list_items(query.learner_id)?;
    let model = RetentionModel::default();

    Ok(Json(ReadinessResponse {
        readiness: model.exam_readiness(&items, exam_date, now),
        exam_date,
        days_until_exam: (exam_date - now).num_days(),
        item_count: items.len(),
    }))
}

/// GET /api/learners/{learner_id}/stats
pub async fn stats(
    State(state): State<AppState>,
    Path(learner_id): Path<Uuid>,
) -> Result<Json<LearnerStatsResponse>> {
    let items = state.store.list_items(learner_id)?;
    let total = items.len();

    let count_at = |level: MasteryLevel| items.iter().filter(|i| i.mastery_level == level).count();
    let mean = |f: fn(&RevisionItem) -> f64| {
        if total == 0 {
            0.0
        } else {
            items.iter().map(f).sum::<f64>() / total as f64
        }
    };

    Ok(Json(LearnerStatsResponse {
        total_items: total,
        learning: count_at(MasteryLevel::Learning),
        reviewing: count_at(MasteryLevel::Reviewing),
        mastered: count_at(MasteryLevel::Mastered),
        overlearned: count_at(MasteryLevel::Overlearned),
        average_ease_factor: mean(|i| i.ease_factor),
        average_interval_days: mean(|i| i.interval_days as f64),
        mean_retention_score: mean(|i| i.retention_score),
        struggling_items: items.iter().filter(|i| i.struggling_count > 0).count(),
    }))
}
