//! Forgetting-curve retention prediction.
//!
//! Pure functions over a single item's state: no clock, no I/O. Elapsed
//! time is always passed in by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MasteryLevel, RevisionItem};

/// Fixed prediction horizons: 1h, 6h, 1d, 3d, 1w, 2w, 1mo.
pub const FORGETTING_HORIZONS_HOURS: [u32; 7] = [1, 6, 24, 72, 168, 336, 720];

/// Exponential-decay memory model `R(t) = base * e^(-t/S)` with a
/// consolidation floor.
///
/// Stability S grows with repetition count, ease factor, mastery level and
/// recall accuracy. Confusion-prone content types shrink S (interference),
/// so they decay faster without breaking the t=0 anchor.
#[derive(Debug, Clone)]
pub struct RetentionModel {
    /// Stability of a once-seen item with neutral state, in hours.
    pub base_stability_hours: f64,
    /// Multiplicative stability gain per successful repetition.
    pub repetition_gain: f64,
    /// Stability multiplier applied to confusion-prone content types.
    pub interference_factor: f64,
    /// Fraction of decayed loss restored by consolidation, scaled by
    /// retention_score/100. Must stay below 1.0.
    pub consolidation_strength: f64,
    /// Days of lead time over which exam readiness saturates.
    pub availability_window_days: f64,
}

impl Default for RetentionModel {
    fn default() -> Self {
        Self {
            base_stability_hours: 24.0,
            repetition_gain: 0.6,
            interference_factor: 0.65,
            consolidation_strength: 0.4,
            availability_window_days: 90.0,
        }
    }
}

/// One point on a forgetting curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionPoint {
    pub hours_elapsed: u32,
    pub predicted_retention: f64,
}

impl RetentionModel {
    /// Memory stability for the item, in hours. Larger is slower decay.
    pub fn stability_hours(&self, item: &RevisionItem) -> f64 {
        let repetition = 1.0 + item.repetition_count as f64 * self.repetition_gain;
        let ease = item.ease_factor / 2.5;
        let mastery = match item.mastery_level {
            MasteryLevel::Learning => 1.0,
            MasteryLevel::Reviewing => 1.3,
            MasteryLevel::Mastered => 1.8,
            MasteryLevel::Overlearned => 2.2,
        };
        let accuracy = 0.5 + item.recall_accuracy.clamp(0.0, 100.0) / 200.0;

        let mut stability = self.base_stability_hours * repetition * ease * mastery * accuracy;
        if item.content_type.is_interference_prone() {
            stability *= self.interference_factor;
        }
        stability.max(1.0)
    }

    /// Predicted retention percentage after `hours_elapsed` hours with no
    /// further review. Anchored at the stored retention score for t=0 and
    /// non-increasing in t.
    pub fn predict_retention(&self, item: &RevisionItem, hours_elapsed: f64) -> f64 {
        let base = item.retention_score.clamp(0.0, 100.0);
        if base == 0.0 {
            return 0.0;
        }
        let stability = self.stability_hours(item);
        let decayed = base * (-hours_elapsed.max(0.0) / stability).exp();
        let floor_fraction = self.consolidated_fraction(base);
        let predicted = decayed + (base - decayed) * floor_fraction;
        predicted.clamp(0.0, 100.0)
    }

    /// Hours until predicted retention first drops to `target_pct`.
    /// Returns 0 when already at or below the target, and `f64::INFINITY`
    /// when the consolidated floor never decays that low.
    pub fn hours_until_retention(&self, item: &RevisionItem, target_pct: f64) -> f64 {
        let base = item.retention_score.clamp(0.0, 100.0);
        if base <= 0.0 || target_pct >= base {
            return 0.0;
        }
        let floor_fraction = self.consolidated_fraction(base);
        // Invert R(t) = base*e*(1-f) + base*f for e = exp(-t/S).
        let ratio = (target_pct / base - floor_fraction) / (1.0 - floor_fraction);
        if ratio <= 0.0 {
            return f64::INFINITY;
        }
        -self.stability_hours(item) * ratio.ln()
    }

    /// Current memory strength 0..100, a weighted blend of retention,
    /// accuracy, repetition saturation and ease.
    pub fn memory_strength(&self, item: &RevisionItem) -> f64 {
        let repetition = (item.repetition_count as f64 / 8.0).min(1.0) * 100.0;
        let ease = (item.ease_factor - 1.3) / 1.2 * 100.0;
        let strength = 0.35 * item.retention_score.clamp(0.0, 100.0)
            + 0.25 * item.recall_accuracy.clamp(0.0, 100.0)
            + 0.25 * repetition
            + 0.15 * ease.clamp(0.0, 100.0);
        strength.clamp(0.0, 100.0)
    }

    /// Exam readiness 0..100: mean memory strength across the item set
    /// weighted by the time-availability factor
    /// `min(1, days_until_exam / window)`. An exam today (or already past)
    /// yields factor 0 and a defined result.
    pub fn exam_readiness(
        &self,
        items: &[RevisionItem],
        exam_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> f64 {
        if items.is_empty() {
            return 0.0;
        }
        let mean_strength =
            items.iter().map(|i| self.memory_strength(i)).sum::<f64>() / items.len() as f64;
        (mean_strength * self.time_availability(exam_date, now)).clamp(0.0, 100.0)
    }

    /// Time-availability factor in [0, 1].
    pub fn time_availability(&self, exam_date: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let days_until = (exam_date - now).num_seconds() as f64 / 86_400.0;
        (days_until / self.availability_window_days).clamp(0.0, 1.0)
    }

    /// Forgetting curve at the fixed horizons, from the item's last-review
    /// anchor.
    pub fn forgetting_curve(&self, item: &RevisionItem) -> Vec<RetentionPoint> {
        FORGETTING_HORIZONS_HOURS
            .iter()
            .map(|&hours| RetentionPoint {
                hours_elapsed: hours,
                predicted_retention: self.predict_retention(item, hours as f64),
            })
            .collect()
    }

    fn consolidated_fraction(&self, base: f64) -> f64 {
        (self.consolidation_strength * base / 100.0).clamp(0.0, 0.95)
    }
}
