//! Test fixtures and factory functions for creating test data.

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use revision_core::{ContentType, ImportanceTier, RevisionItem};

/// Create an item-ingestion request body.
pub fn create_item_request(owner_id: Uuid, subject: &str, title: &str) -> serde_json::Value {
    json!({
        "owner_id": owner_id,
        "content_type": "concept",
        "subject": subject,
        "topic": "unit-1",
        "title": title,
        "key_points": ["point one", "point two"],
    })
}

/// Create a review submission body.
pub fn review_request(
    learner_id: Uuid,
    item_id: Uuid,
    rating: &str,
    confidence: u8,
    time_spent_seconds: u32,
) -> serde_json::Value {
    json!({
        "learner_id": learner_id,
        "item_id": item_id,
        "rating": rating,
        "confidence": confidence,
        "time_spent_seconds": time_spent_seconds,
        "hints_used": 0,
    })
}

/// Create a schedule request body with explicit capacity knobs.
pub fn schedule_request(
    learner_id: Uuid,
    daily_minutes: u32,
    minutes_per_item: Option<f64>,
    exam_date: Option<chrono::DateTime<Utc>>,
) -> serde_json::Value {
    json!({
        "learner_id": learner_id,
        "preferences": {
            "daily_minutes": daily_minutes,
            "look_ahead_days": 2,
            "minutes_per_item": minutes_per_item,
            "exam_date": exam_date,
        },
    })
}

/// An item already past due, seeded directly into the store.
pub fn overdue_item(
    owner_id: Uuid,
    subject: &str,
    days_overdue: i64,
    importance: ImportanceTier,
) -> RevisionItem {
    let created = Utc::now() - Duration::days(days_overdue);
    let mut item = RevisionItem::new(
        owner_id,
        Uuid::new_v4(),
        ContentType::Concept,
        subject,
        "unit-1",
        format!("{subject} item"),
        created,
    );
    item.importance_tier = importance;
    item
}
