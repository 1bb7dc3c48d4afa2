//! Core types for the revision scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SchedulerError};

/// Upper bound accepted for a single answer, in seconds.
pub const MAX_TIME_SPENT_SECONDS: u32 = 3600;

/// Upper bound accepted for hints used on a single answer.
pub const MAX_HINTS_USED: u32 = 20;

/// Self-assessed recall quality for one review.
///
/// Ordered Again < Hard < Good < Easy. This is a quality judgment, not a
/// score; numeric conversions exist only for transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Create from 4-point numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }

    /// Whether the item was recalled at all. Again is the only failure.
    pub fn is_recall_success(self) -> bool {
        self != Self::Again
    }

    /// Retention score implied by this rating alone, before confidence and
    /// speed adjustments.
    pub fn retention_value(self) -> f64 {
        match self {
            Self::Easy => 95.0,
            Self::Good => 80.0,
            Self::Hard => 60.0,
            Self::Again => 30.0,
        }
    }
}

/// Difficulty tier of an item. Determines which interval ladder applies
/// and the expected answer time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
}

impl DifficultyTier {
    /// One tier harder, saturating at Hard.
    pub fn escalated(self) -> Self {
        match self {
            Self::Easy => Self::Medium,
            Self::Medium | Self::Hard => Self::Hard,
        }
    }

    /// One tier easier, saturating at Easy.
    pub fn deescalated(self) -> Self {
        match self {
            Self::Hard => Self::Medium,
            Self::Medium | Self::Easy => Self::Easy,
        }
    }

    /// Numeric rank: Easy 0, Medium 1, Hard 2.
    pub fn rank(self) -> u8 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }

    /// Tier from a numeric rank, clamping out-of-range values.
    pub fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Self::Easy,
            1 => Self::Medium,
            _ => Self::Hard,
        }
    }

    /// Expected answer time for this tier, used as the speed baseline.
    pub fn expected_answer_seconds(self) -> u32 {
        match self {
            Self::Easy => 15,
            Self::Medium => 25,
            Self::Hard => 40,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// Importance of an item for the exam, set at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceTier {
    Low,
    Medium,
    High,
    Critical,
}

impl ImportanceTier {
    /// Numeric rank: Low 0 through Critical 3.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }
}

/// Coarse lifecycle stage of an item. Advances with repeated successful
/// recall and regresses on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    Learning,
    Reviewing,
    Mastered,
    Overlearned,
}

impl MasteryLevel {
    /// One stage back, saturating at Learning.
    pub fn demoted(self) -> Self {
        match self {
            Self::Learning | Self::Reviewing => Self::Learning,
            Self::Mastered => Self::Reviewing,
            Self::Overlearned => Self::Mastered,
        }
    }
}

/// Kind of study material an item was generated from. Opaque to scheduling
/// except for interference: fast-changing topical content decays faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Concept,
    Fact,
    Formula,
    Vocabulary,
    CurrentAffairs,
}

impl ContentType {
    /// Confusion-prone kinds take an interference penalty in the
    /// retention model.
    pub fn is_interference_prone(self) -> bool {
        matches!(self, Self::Vocabulary | Self::CurrentAffairs)
    }
}

/// One answer submission. Ephemeral: consumed by exactly one review, then
/// folded into a performance snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub rating: Rating,
    /// Self-reported confidence, 1 (guessing) to 5 (certain).
    pub confidence: u8,
    pub time_spent_seconds: u32,
    pub hints_used: u32,
}

impl ReviewEvent {
    /// Reject malformed events before any state is touched.
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.confidence) {
            return Err(SchedulerError::InvalidConfidence {
                value: self.confidence,
            });
        }
        if self.time_spent_seconds == 0 || self.time_spent_seconds > MAX_TIME_SPENT_SECONDS {
            return Err(SchedulerError::InvalidTimeSpent {
                seconds: self.time_spent_seconds,
                max: MAX_TIME_SPENT_SECONDS,
            });
        }
        if self.hints_used > MAX_HINTS_USED {
            return Err(SchedulerError::InvalidHintsUsed {
                count: self.hints_used,
                max: MAX_HINTS_USED,
            });
        }
        Ok(())
    }
}

/// One revisable knowledge unit with its full scheduling and performance
/// state. Immutable: a review produces a new value via
/// [`RevisionItem::apply_review`](crate::scheduler), never an in-place edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionItem {
    pub item_id: Uuid,
    pub owner_id: Uuid,
    pub content_id: Uuid,
    pub content_type: ContentType,
    pub subject: String,
    pub topic: String,

    // Static payload, opaque to scheduling.
    pub title: String,
    pub key_points: Vec<String>,
    pub supporting_facts: Vec<String>,

    // Scheduling state.
    pub difficulty_tier: DifficultyTier,
    pub importance_tier: ImportanceTier,
    pub interval_days: u32,
    pub repetition_count: u32,
    pub ease_factor: f64,
    pub next_due_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,

    // Performance state.
    pub retention_score: f64,
    pub recall_accuracy: f64,
    pub last_recall_latency_seconds: u32,
    pub struggling_count: u32,
    pub mastery_level: MasteryLevel,
}

impl RevisionItem {
    /// Create a freshly ingested item, due immediately.
    pub fn new(
        owner_id: Uuid,
        content_id: Uuid,
        content_type: ContentType,
        subject: impl Into<String>,
        topic: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id: Uuid::new_v4(),
            owner_id,
            content_id,
            content_type,
            subject: subject.into(),
            topic: topic.into(),
            title: title.into(),
            key_points: Vec::new(),
            supporting_facts: Vec::new(),
            difficulty_tier: DifficultyTier::Medium,
            importance_tier: ImportanceTier::Medium,
            interval_days: 0,
            repetition_count: 0,
            ease_factor: 2.5,
            next_due_at: created_at,
            last_reviewed_at: None,
            retention_score: 50.0,
            recall_accuracy: 50.0,
            last_recall_latency_seconds: 0,
            struggling_count: 0,
            mastery_level: MasteryLevel::Learning,
        }
    }

    /// Whether the item is due at the given instant.
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.next_due_at <= as_of
    }

    /// Whole days past due; negative when the item is not yet due.
    pub fn overdue_days(&self, as_of: DateTime<Utc>) -> i64 {
        (as_of - self.next_due_at).num_days()
    }

    /// Hours since the last review, or since creation-due for an item
    /// never reviewed.
    pub fn hours_since_review(&self, as_of: DateTime<Utc>) -> f64 {
        let anchor = self.last_reviewed_at.unwrap_or(self.next_due_at);
        ((as_of - anchor).num_seconds() as f64 / 3600.0).max(0.0)
    }

    /// Copy with a different difficulty tier (the adapter's decision is
    /// applied before interval computation).
    pub fn with_difficulty_tier(&self, tier: DifficultyTier) -> Self {
        Self {
            difficulty_tier: tier,
            ..self.clone()
        }
    }
}

/// Append-only record of one review's observable performance, the unit the
/// difficulty adapter reasons over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Rating-derived accuracy, 0-100.
    pub accuracy: f64,
    /// Expected over actual answer time; above 1.0 means faster than
    /// expected for the item's tier.
    pub speed: f64,
    pub confidence: u8,
    pub streak_at_time: u32,
    pub context_tag: String,
}

impl PerformanceSnapshot {
    /// Derive a snapshot from one review event against an item's tier.
    /// Hints discount the rating-derived accuracy: a recall that needed
    /// prompting was not a full recall.
    pub fn from_event(
        event: &ReviewEvent,
        tier: DifficultyTier,
        streak_at_time: u32,
        context_tag: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let expected = tier.expected_answer_seconds() as f64;
        let speed = expected / event.time_spent_seconds.max(1) as f64;
        let accuracy =
            (event.rating.retention_value() - 5.0 * event.hints_used as f64).clamp(0.0, 100.0);
        Self {
            timestamp,
            accuracy,
            speed,
            confidence: event.confidence,
            streak_at_time,
            context_tag: context_tag.into(),
        }
    }
}

/// Named session slot within a study day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    MorningIntensive,
    EveningRecall,
    WeekendComprehensive,
    CatchUp,
}

impl SessionType {
    /// Per-item time estimate for capacity planning, in minutes.
    pub fn minutes_per_item(self) -> f64 {
        match self {
            Self::MorningIntensive => 3.0,
            Self::EveningRecall => 2.0,
            Self::WeekendComprehensive => 4.0,
            Self::CatchUp => 2.5,
        }
    }

    /// Hour of day (UTC) at which the session window opens.
    pub fn start_hour(self) -> u32 {
        match self {
            Self::MorningIntensive => 7,
            Self::EveningRecall => 19,
            Self::WeekendComprehensive => 10,
            Self::CatchUp => 21,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MorningIntensive => "morning_intensive",
            Self::EveningRecall => "evening_recall",
            Self::WeekendComprehensive => "weekend_comprehensive",
            Self::CatchUp => "catch_up",
        }
    }
}

/// One planned, time-boxed block of reviews. Regenerated per planning
/// cycle; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSession {
    pub session_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub session_type: SessionType,
    pub ordered_item_ids: Vec<Uuid>,
    pub estimated_duration_minutes: u32,
    pub priority_score: f64,
}

impl ScheduleSession {
    /// Half-open `[start, end)` interval overlap.
    pub fn overlaps(&self, other: &ScheduleSession) -> bool {
        self.window_start < other.window_end && other.window_start < self.window_end
    }
}

/// Learner-supplied knobs for schedule construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPreferences {
    /// Total review minutes available on the planned day.
    pub daily_minutes: u32,
    /// Days past the planned day to pull upcoming items from, for batching.
    pub look_ahead_days: u32,
    /// Overrides the per-session-type time estimate when set.
    pub minutes_per_item: Option<f64>,
    pub exam_date: Option<DateTime<Utc>>,
}

impl Default for StudyPreferences {
    fn default() -> Self {
        Self {
            daily_minutes: 60,
            look_ahead_days: 2,
            minutes_per_item: None,
            exam_date: None,
        }
    }
}
