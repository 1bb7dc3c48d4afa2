//! API request and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export shared types from revision-core
pub use revision_core::types::{
    ContentType, DifficultyTier, ImportanceTier, MasteryLevel, PerformanceSnapshot, Rating,
    ReviewEvent, RevisionItem, ScheduleSession, SessionType, StudyPreferences,
};
pub use revision_core::{RetentionPoint, TierDecision};

// === Item types ===

/// Payload from the content-ingestion collaborator.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub owner_id: Uuid,
    pub content_id: Option<Uuid>,
    pub content_type: ContentType,
    pub subject: String,
    pub topic: String,
    pub title: String,
    pub key_points: Option<Vec<String>>,
    pub supporting_facts: Option<Vec<String>>,
    pub importance_tier: Option<ImportanceTier>,
    pub difficulty_tier: Option<DifficultyTier>,
}

impl CreateItemRequest {
    /// Build the initial item state. Anything not supplied keeps the
    /// new-item defaults.
    pub fn into_item(self, now: DateTime<Utc>) -> RevisionItem {
        let mut item = RevisionItem::new(
            self.owner_id,
            self.content_id.unwrap_or_else(Uuid::new_v4),
            self.content_type,
            self.subject,
            self.topic,
            self.title,
            now,
        );
        if let Some(points) = self.key_points {
            item.key_points = points;
        }
        if let Some(facts) = self.supporting_facts {
            item.supporting_facts = facts;
        }
        if let Some(importance) = self.importance_tier {
            item.importance_tier = importance;
        }
        if let Some(difficulty) = self.difficulty_tier {
            item.difficulty_tier = difficulty;
        }
        item
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueItemsQuery {
    pub learner_id: Uuid,
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueItemsResponse {
    pub items: Vec<RevisionItem>,
}

// === Review types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub learner_id: Uuid,
    pub item_id: Uuid,
    pub rating: Rating,
    pub confidence: u8,
    pub time_spent_seconds: u32,
    pub hints_used: Option<u32>,
    pub context_tag: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitReviewResponse {
    pub item: RevisionItem,
    pub tier_decision: TierDecision,
    /// Intervals the next review would get per rating:
    /// [again, hard, good, easy].
    pub preview_intervals: [u32; 4],
}

// === Schedule types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub learner_id: Uuid,
    pub date: Option<DateTime<Utc>>,
    pub preferences: Option<StudyPreferences>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub sessions: Vec<ScheduleSession>,
    /// Dedicated recovery sessions for missed items that did not fit the
    /// day's regular capacity.
    pub catch_up_sessions: Vec<ScheduleSession>,
}

// === Insight types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct ForgettingQuery {
    pub learner_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForgettingResponse {
    pub item_id: Uuid,
    pub points: Vec<RetentionPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessQuery {
    pub learner_id: Uuid,
    pub exam_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub readiness: f64,
    pub exam_date: DateTime<Utc>,
    pub days_until_exam: i64,
    pub item_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerStatsResponse {
    pub total_items: usize,
    pub learning: usize,
    pub reviewing: usize,
    pub mastered: usize,
    pub overlearned: usize,
    pub average_ease_factor: f64,
    pub average_interval_days: f64,
    pub mean_retention_score: f64,
    pub struggling_items: usize,
}
