//! Interval and ease-factor scheduling.
//!
//! Blends a difficulty-tiered SM-2-style interval with an exam-aware
//! interval derived from the retention model. Deterministic given
//! (item, event, config, now); the only state transition is the immutable
//! [`RevisionItem::apply_review`].

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::retention::RetentionModel;
use crate::types::{
    DifficultyTier, ImportanceTier, MasteryLevel, Rating, ReviewEvent, RevisionItem,
};

/// Per-rating ease-factor delta.
const EASE_DELTA_EASY: f64 = 0.15;
const EASE_DELTA_GOOD: f64 = 0.05;
const EASE_DELTA_HARD: f64 = -0.20;
const EASE_DELTA_AGAIN: f64 = -0.30;

/// Ease correction step per point of confidence away from neutral (3).
const CONFIDENCE_EASE_STEP: f64 = 0.05;
/// Ease correction applied for answering under/over the slow threshold.
const SPEED_EASE_STEP: f64 = 0.1;
/// Interval multiplier step per point of confidence away from neutral.
const CONFIDENCE_INTERVAL_STEP: f64 = 0.1;
/// Retention-score adjustment per point of confidence away from neutral.
const CONFIDENCE_RETENTION_STEP: f64 = 3.0;
/// Retention-score adjustment for notably fast or slow answers.
const SPEED_RETENTION_ADJUST: f64 = 5.0;

/// New state computed for one review. Applied to an item via
/// [`RevisionItem::apply_review`].
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub interval_days: u32,
    pub ease_factor: f64,
    pub next_due_at: DateTime<Utc>,
    pub retention_score: f64,
    pub recall_accuracy: f64,
    pub mastery_level: MasteryLevel,
    pub struggling_count: u32,
    pub repetition_count: u32,
    pub reviewed_at: DateTime<Utc>,
}

/// Interval scheduler with difficulty-tiered ladders and exam awareness.
///
/// The 0.6/0.4 blend and the [1, 90] day clamp are tunable defaults, not
/// requirements; adjust the fields to taste.
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    pub easy_ladder: [u32; 6],
    pub medium_ladder: [u32; 6],
    pub hard_ladder: [u32; 6],
    /// Interval factor for an Easy rating.
    pub easy_factor: f64,
    /// Interval factor for a Hard rating.
    pub hard_factor: f64,
    /// Answers above this take the slow path for ease, interval and
    /// retention adjustments.
    pub slow_threshold_seconds: u32,
    pub fast_multiplier: f64,
    pub slow_multiplier: f64,
    pub sm2_weight: f64,
    pub exam_weight: f64,
    pub min_interval_days: u32,
    pub max_interval_days: u32,
    pub min_ease: f64,
    pub max_ease: f64,
    /// Retention probability targeted at the exam date.
    pub target_exam_retention: f64,
    /// Remaining-review budgets before the exam, by importance tier.
    pub budget_critical: u32,
    pub budget_high: u32,
    pub budget_medium: u32,
    pub budget_low: u32,
    /// Externally supplied exam date; None disables the exam-aware blend.
    pub exam_date: Option<DateTime<Utc>>,
    pub retention: RetentionModel,
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self {
            easy_ladder: [1, 3, 7, 14, 30, 60],
            medium_ladder: [1, 2, 5, 10, 21, 45],
            hard_ladder: [1, 1, 3, 7, 14, 30],
            easy_factor: 1.4,
            hard_factor: 0.6,
            slow_threshold_seconds: 30,
            fast_multiplier: 1.2,
            slow_multiplier: 0.8,
            sm2_weight: 0.6,
            exam_weight: 0.4,
            min_interval_days: 1,
            max_interval_days: 90,
            min_ease: 1.3,
            max_ease: 2.5,
            target_exam_retention: 0.85,
            budget_critical: 12,
            budget_high: 9,
            budget_medium: 6,
            budget_low: 4,
            exam_date: None,
            retention: RetentionModel::default(),
        }
    }
}

impl IntervalScheduler {
    /// Scheduler with an exam date configured.
    pub fn with_exam_date(exam_date: Option<DateTime<Utc>>) -> Self {
        Self {
            exam_date,
            ..Self::default()
        }
    }

    /// Compute the full next state for one review. Rejects malformed
    /// events before touching anything.
    pub fn compute_next_state(
        &self,
        item: &RevisionItem,
        event: &ReviewEvent,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        event.validate()?;

        let slow = event.time_spent_seconds > self.slow_threshold_seconds;
        let fast_correct = event.rating.is_recall_success() && !slow;

        let ease_factor = self.next_ease(item.ease_factor, event, slow);
        let retention_score = blend_score(
            item.retention_score,
            derived_score(event, fast_correct, slow),
            0.7,
        );
        let recall_accuracy = blend_score(
            item.recall_accuracy,
            derived_score(event, fast_correct, slow),
            0.3,
        );

        let interval_days = if event.rating == Rating::Again {
            // A failed recall is revisited tomorrow, no matter the history.
            self.min_interval_days.max(1)
        } else {
            let sm2_days = self.sm2_interval(item, event, ease_factor, fast_correct, slow);
            let blended = match self.exam_date {
                Some(exam) => {
                    let exam_days = self.exam_aware_interval(item, now, exam);
                    self.sm2_weight * sm2_days + self.exam_weight * exam_days
                }
                None => sm2_days,
            };
            (blended.round() as i64)
                .clamp(self.min_interval_days.max(1) as i64, self.max_interval_days as i64)
                as u32
        };

        let struggled = !event.rating.is_recall_success() || event.rating == Rating::Hard;
        let struggling_count = item.struggling_count + u32::from(struggled);
        let repetition_count = if event.rating == Rating::Again {
            0
        } else {
            item.repetition_count + 1
        };

        let mastery_level = self.next_mastery(
            item.mastery_level,
            event.rating,
            repetition_count,
            retention_score,
            struggled,
        );

        Ok(ReviewOutcome {
            interval_days,
            ease_factor,
            next_due_at: now + Duration::days(interval_days as i64),
            retention_score,
            recall_accuracy,
            mastery_level,
            struggling_count,
            repetition_count,
            reviewed_at: now,
        })
    }

    /// Intervals each rating would produce, as [Again, Hard, Good, Easy].
    /// Assumes a neutral answer (confidence 3, 20 s, no hints).
    pub fn preview_intervals(
        &self,
        item: &RevisionItem,
        now: DateTime<Utc>,
    ) -> Result<[u32; 4]> {
        let mut intervals = [0u32; 4];
        for (slot, rating) in [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy]
            .into_iter()
            .enumerate()
        {
            let event = ReviewEvent {
                rating,
                confidence: 3,
                time_spent_seconds: 20,
                hints_used: 0,
            };
            intervals[slot] = self.compute_next_state(item, &event, now)?.interval_days;
        }
        Ok(intervals)
    }

    /// The interval ladder for a difficulty tier.
    pub fn ladder(&self, tier: DifficultyTier) -> &[u32; 6] {
        match tier {
            DifficultyTier::Easy => &self.easy_ladder,
            DifficultyTier::Medium => &self.medium_ladder,
            DifficultyTier::Hard => &self.hard_ladder,
        }
    }

    /// Exam-aware interval in days: the remaining review budget spaced
    /// evenly over the time left, scaled by how the item's memory strength
    /// compares to the terminal retention target. Weak items come back
    /// sooner than their even share; strong items may stretch past it.
    /// A passed exam date degrades to 1 (revise immediately) instead of
    /// failing.
    pub fn exam_aware_interval(
        &self,
        item: &RevisionItem,
        now: DateTime<Utc>,
        exam_date: DateTime<Utc>,
    ) -> f64 {
        if exam_date <= now {
            return 1.0;
        }
        let days_remaining = (exam_date - now).num_seconds() as f64 / 86_400.0;
        let budget = self.review_budget(item.importance_tier);
        let remaining_reviews = budget.saturating_sub(item.repetition_count).max(1);
        let spacing = days_remaining / remaining_reviews as f64;

        let strength = self.retention.memory_strength(item);
        let target_pct = self.target_exam_retention * 100.0;
        let strength_factor = (strength / target_pct).clamp(0.25, 1.5);

        (spacing * strength_factor).clamp(1.0, days_remaining.max(1.0))
    }

    /// Remaining-review budget before the exam for an importance tier.
    pub fn review_budget(&self, importance: ImportanceTier) -> u32 {
        match importance {
            ImportanceTier::Critical => self.budget_critical,
            ImportanceTier::High => self.budget_high,
            ImportanceTier::Medium => self.budget_medium,
            ImportanceTier::Low => self.budget_low,
        }
    }

    fn next_ease(&self, current: f64, event: &ReviewEvent, slow: bool) -> f64 {
        let rating_delta = match event.rating {
            Rating::Easy => EASE_DELTA_EASY,
            Rating::Good => EASE_DELTA_GOOD,
            Rating::Hard => EASE_DELTA_HARD,
            Rating::Again => EASE_DELTA_AGAIN,
        };
        let confidence_correction =
            (event.confidence as f64 - 3.0) * CONFIDENCE_EASE_STEP;
        let speed_correction = if slow { -SPEED_EASE_STEP } else { SPEED_EASE_STEP };
        (current + rating_delta + confidence_correction + speed_correction)
            .clamp(self.min_ease, self.max_ease)
    }

    fn sm2_interval(
        &self,
        item: &RevisionItem,
        event: &ReviewEvent,
        ease_factor: f64,
        fast_correct: bool,
        slow: bool,
    ) -> f64 {
        let ladder = self.ladder(item.difficulty_tier);
        let index = (item.repetition_count as usize).min(ladder.len() - 1);
        let rating_factor = match event.rating {
            Rating::Easy => self.easy_factor,
            Rating::Good => 1.0,
            Rating::Hard => self.hard_factor,
            // Handled by the caller; an Again never reaches here.
            Rating::Again => 0.0,
        };
        let confidence_multiplier =
            1.0 + (event.confidence as f64 - 3.0) * CONFIDENCE_INTERVAL_STEP;
        let speed_multiplier = if fast_correct {
            self.fast_multiplier
        } else if slow {
            self.slow_multiplier
        } else {
            1.0
        };
        ladder[index] as f64 * rating_factor * ease_factor * confidence_multiplier
            * speed_multiplier
    }

    fn next_mastery(
        &self,
        current: MasteryLevel,
        rating: Rating,
        repetition_count: u32,
        retention_score: f64,
        struggled: bool,
    ) -> MasteryLevel {
        if rating == Rating::Again {
            return current.demoted();
        }
        // Promotion past Reviewing requires a review that left
        // struggling_count untouched.
        match current {
            MasteryLevel::Learning if repetition_count >= 2 && retention_score >= 55.0 => {
                MasteryLevel::Reviewing
            }
            MasteryLevel::Reviewing
                if repetition_count >= 5 && retention_score >= 75.0 && !struggled =>
            {
                MasteryLevel::Mastered
            }
            MasteryLevel::Mastered
                if repetition_count >= 8 && retention_score >= 90.0 && !struggled =>
            {
                MasteryLevel::Overlearned
            }
            other => other,
        }
    }
}

/// Rating-derived score adjusted by confidence and speed, 0..100.
fn derived_score(event: &ReviewEvent, fast_correct: bool, slow: bool) -> f64 {
    let speed_adjust = if fast_correct {
        SPEED_RETENTION_ADJUST
    } else if slow {
        -SPEED_RETENTION_ADJUST
    } else {
        0.0
    };
    (event.rating.retention_value()
        + (event.confidence as f64 - 3.0) * CONFIDENCE_RETENTION_STEP
        + speed_adjust)
        .clamp(0.0, 100.0)
}

/// `new_weight` of the derived score blended into the previous value.
fn blend_score(previous: f64, derived: f64, new_weight: f64) -> f64 {
    ((1.0 - new_weight) * previous + new_weight * derived).clamp(0.0, 100.0)
}

impl RevisionItem {
    /// The single state transition per review: a new item value with the
    /// outcome folded in. The original is untouched.
    pub fn apply_review(&self, outcome: &ReviewOutcome, event: &ReviewEvent) -> RevisionItem {
        RevisionItem {
            interval_days: outcome.interval_days,
            repetition_count: outcome.repetition_count,
            ease_factor: outcome.ease_factor,
            next_due_at: outcome.next_due_at,
            last_reviewed_at: Some(outcome.reviewed_at),
            retention_score: outcome.retention_score,
            recall_accuracy: outcome.recall_accuracy,
            last_recall_latency_seconds: event.time_spent_seconds,
            struggling_count: outcome.struggling_count,
            mastery_level: outcome.mastery_level,
            ..self.clone()
        }
    }
}
