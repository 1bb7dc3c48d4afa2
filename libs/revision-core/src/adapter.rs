//! Performance-driven difficulty adaptation.
//!
//! An ordered rule table over a sliding window of performance snapshots.
//! Rules are data, evaluated first-match-wins; a decision moves an item at
//! most one tier.

use serde::{Deserialize, Serialize};

use crate::types::{DifficultyTier, PerformanceSnapshot};

/// Snapshots considered per decision; older history is ignored.
pub const DECISION_WINDOW: usize = 15;

/// One adaptation rule. Each variant carries its own thresholds so the
/// table stays independently testable and reorderable.
#[derive(Debug, Clone, PartialEq)]
pub enum AdaptationRule {
    /// Consecutive high-accuracy reviews escalate any non-hard tier.
    HighAccuracyStreak { min_run: usize, min_accuracy: f64 },
    /// Consecutive low-accuracy reviews de-escalate any non-easy tier.
    LowAccuracyStreak { min_run: usize, max_accuracy: f64 },
    /// Consecutive fast and confident reviews graduate an easy item.
    FastConfidentStreak {
        min_run: usize,
        min_speed: f64,
        min_confidence: u8,
    },
    /// Consecutive slow and unsure reviews soften a hard item.
    SlowUnsureStreak {
        min_run: usize,
        max_speed: f64,
        max_confidence: u8,
    },
    /// Flat accuracy over a long stretch: the item stopped teaching
    /// anything, push it up.
    Plateau { min_len: usize, max_variance: f64 },
    /// Steady improvement on an easy item.
    PositiveTrend { min_len: usize, min_slope: f64 },
}

impl AdaptationRule {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HighAccuracyStreak { .. } => "high_accuracy_streak",
            Self::LowAccuracyStreak { .. } => "low_accuracy_streak",
            Self::FastConfidentStreak { .. } => "fast_confident_streak",
            Self::SlowUnsureStreak { .. } => "slow_unsure_streak",
            Self::Plateau { .. } => "plateau",
            Self::PositiveTrend { .. } => "positive_trend",
        }
    }

    /// Proposed tier when the rule fires, None otherwise.
    pub fn evaluate(
        &self,
        window: &[PerformanceSnapshot],
        current: DifficultyTier,
    ) -> Option<DifficultyTier> {
        match *self {
            Self::HighAccuracyStreak { min_run, min_accuracy } => {
                let run = trailing_run(window, |s| s.accuracy >= min_accuracy);
                (run >= min_run && current != DifficultyTier::Hard)
                    .then(|| current.escalated())
            }
            Self::LowAccuracyStreak { min_run, max_accuracy } => {
                let run = trailing_run(window, |s| s.accuracy <= max_accuracy);
                (run >= min_run && current != DifficultyTier::Easy)
                    .then(|| current.deescalated())
            }
            Self::FastConfidentStreak {
                min_run,
                min_speed,
                min_confidence,
            } => {
                let run = trailing_run(window, |s| {
                    s.speed > min_speed && s.confidence >= min_confidence
                });
                (run >= min_run && current == DifficultyTier::Easy)
                    .then_some(DifficultyTier::Medium)
            }
            Self::SlowUnsureStreak {
                min_run,
                max_speed,
                max_confidence,
            } => {
                let run = trailing_run(window, |s| {
                    s.speed < max_speed && s.confidence <= max_confidence
                });
                (run >= min_run && current == DifficultyTier::Hard)
                    .then_some(DifficultyTier::Medium)
            }
            Self::Plateau { min_len, max_variance } => {
                (window.len() >= min_len
                    && accuracy_variance(window) < max_variance
                    && current != DifficultyTier::Hard)
                    .then(|| current.escalated())
            }
            Self::PositiveTrend { min_len, min_slope } => {
                (window.len() >= min_len
                    && accuracy_slope(window) > min_slope
                    && current == DifficultyTier::Easy)
                    .then_some(DifficultyTier::Medium)
            }
        }
    }
}

/// Outcome of one adaptation decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierDecision {
    pub next_tier: DifficultyTier,
    pub reason: String,
    pub triggered_rules: Vec<String>,
}

/// Rule-table difficulty adapter with a parallel flow-state score.
#[derive(Debug, Clone)]
pub struct DifficultyAdapter {
    /// Evaluated in order; the first firing rule wins.
    pub rules: Vec<AdaptationRule>,
    /// Flow score at or above which hard is recommended.
    pub flow_hard_threshold: f64,
    /// Flow score at or above which medium is recommended.
    pub flow_medium_threshold: f64,
}

impl Default for DifficultyAdapter {
    fn default() -> Self {
        Self {
            rules: vec![
                AdaptationRule::HighAccuracyStreak {
                    min_run: 3,
                    min_accuracy: 85.0,
                },
                AdaptationRule::LowAccuracyStreak {
                    min_run: 3,
                    max_accuracy: 50.0,
                },
                AdaptationRule::FastConfidentStreak {
                    min_run: 3,
                    min_speed: 1.5,
                    min_confidence: 4,
                },
                AdaptationRule::SlowUnsureStreak {
                    min_run: 3,
                    max_speed: 0.7,
                    max_confidence: 2,
                },
                AdaptationRule::Plateau {
                    min_len: 8,
                    max_variance: 5.0,
                },
                AdaptationRule::PositiveTrend {
                    min_len: 6,
                    min_slope: 0.1,
                },
            ],
            flow_hard_threshold: 60.0,
            flow_medium_threshold: 20.0,
        }
    }
}

impl DifficultyAdapter {
    /// Decide the item's next tier from the most recent snapshots.
    ///
    /// Only the trailing [`DECISION_WINDOW`] snapshots are considered. No
    /// firing rule leaves the tier unchanged. The result is always within
    /// one step of `current`.
    pub fn decide(
        &self,
        window: &[PerformanceSnapshot],
        current: DifficultyTier,
    ) -> TierDecision {
        let start = window.len().saturating_sub(DECISION_WINDOW);
        let recent = &window[start..];

        for rule in &self.rules {
            if let Some(next_tier) = rule.evaluate(recent, current) {
                return TierDecision {
                    next_tier,
                    reason: format!(
                        "{} moved tier {} -> {}",
                        rule.name(),
                        current.as_str(),
                        next_tier.as_str()
                    ),
                    triggered_rules: vec![rule.name().to_string()],
                };
            }
        }

        TierDecision {
            next_tier: current,
            reason: "no adaptation rule matched".to_string(),
            triggered_rules: Vec::new(),
        }
    }

    /// Flow-state score in [-100, 100]: positive when difficulty matches
    /// skill, negative under frustration or boredom.
    pub fn flow_score(&self, window: &[PerformanceSnapshot]) -> f64 {
        if window.is_empty() {
            return 0.0;
        }
        let start = window.len().saturating_sub(DECISION_WINDOW);
        let recent = &window[start..];
        let total: f64 = recent.iter().map(flow_signal).sum();
        (total / recent.len() as f64).clamp(-100.0, 100.0)
    }

    /// Tier recommended by flow score alone.
    pub fn recommend_from_flow(&self, score: f64) -> DifficultyTier {
        if score >= self.flow_hard_threshold {
            DifficultyTier::Hard
        } else if score >= self.flow_medium_threshold {
            DifficultyTier::Medium
        } else {
            DifficultyTier::Easy
        }
    }

    /// Blend the rule decision (50%), flow recommendation (30%) and
    /// long-run comfort zone (20%) into a final tier, stepping at most one
    /// tier from `current`.
    pub fn synthesize_tier(
        &self,
        current: DifficultyTier,
        window: &[PerformanceSnapshot],
    ) -> DifficultyTier {
        let rule_tier = self.decide(window, current).next_tier;
        let flow_tier = self.recommend_from_flow(self.flow_score(window));
        let comfort_tier = comfort_zone_tier(window);

        let blended = 0.5 * rule_tier.rank() as f64
            + 0.3 * flow_tier.rank() as f64
            + 0.2 * comfort_tier.rank() as f64;
        let target = DifficultyTier::from_rank(blended.round() as u8);

        step_toward(current, target)
    }
}

/// Tier the learner's long-run accuracy says they are comfortable at.
fn comfort_zone_tier(window: &[PerformanceSnapshot]) -> DifficultyTier {
    if window.is_empty() {
        return DifficultyTier::Medium;
    }
    let mean = window.iter().map(|s| s.accuracy).sum::<f64>() / window.len() as f64;
    if mean >= 85.0 {
        DifficultyTier::Hard
    } else if mean >= 65.0 {
        DifficultyTier::Medium
    } else {
        DifficultyTier::Easy
    }
}

/// Move one step from `current` toward `target`.
fn step_toward(current: DifficultyTier, target: DifficultyTier) -> DifficultyTier {
    match target.rank().cmp(&current.rank()) {
        std::cmp::Ordering::Greater => current.escalated(),
        std::cmp::Ordering::Less => current.deescalated(),
        std::cmp::Ordering::Equal => current,
    }
}

/// Per-snapshot flow signal in [-100, 100].
fn flow_signal(snapshot: &PerformanceSnapshot) -> f64 {
    let frustrated =
        snapshot.accuracy < 50.0 || (snapshot.speed < 0.7 && snapshot.confidence <= 2);
    let bored = snapshot.speed > 2.0 && snapshot.accuracy >= 90.0 && snapshot.confidence >= 4;
    let engaged = snapshot.accuracy >= 70.0
        && snapshot.confidence >= 3
        && (0.8..=2.0).contains(&snapshot.speed);

    if frustrated {
        -70.0
    } else if bored {
        -30.0
    } else if engaged {
        80.0
    } else {
        10.0
    }
}

/// Length of the trailing run of snapshots satisfying `pred`.
fn trailing_run<F>(window: &[PerformanceSnapshot], pred: F) -> usize
where
    F: Fn(&PerformanceSnapshot) -> bool,
{
    window.iter().rev().take_while(|s| pred(s)).count()
}

/// Population variance of accuracy over the window.
fn accuracy_variance(window: &[PerformanceSnapshot]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let n = window.len() as f64;
    let mean = window.iter().map(|s| s.accuracy).sum::<f64>() / n;
    window.iter().map(|s| (s.accuracy - mean).powi(2)).sum::<f64>() / n
}

/// Least-squares slope of accuracy against snapshot index.
fn accuracy_slope(window: &[PerformanceSnapshot]) -> f64 {
    let n = window.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = window.iter().map(|s| s.accuracy).sum::<f64>() / n_f;
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, snapshot) in window.iter().enumerate() {
        let dx = i as f64 - mean_x;
        numerator += dx * (snapshot.accuracy - mean_y);
        denominator += dx * dx;
    }
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot(accuracy: f64, speed: f64, confidence: u8) -> PerformanceSnapshot {
        PerformanceSnapshot {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            accuracy,
            speed,
            confidence,
            streak_at_time: 0,
            context_tag: "test".to_string(),
        }
    }

    fn repeated(accuracy: f64, speed: f64, confidence: u8, n: usize) -> Vec<PerformanceSnapshot> {
        (0..n).map(|_| snapshot(accuracy, speed, confidence)).collect()
    }

    #[test]
    fn high_accuracy_streak_escalates_medium_to_hard() {
        let adapter = DifficultyAdapter::default();
        let window = repeated(90.0, 1.0, 3, 3);
        let decision = adapter.decide(&window, DifficultyTier::Medium);
        assert_eq!(decision.next_tier, DifficultyTier::Hard);
        assert_eq!(decision.triggered_rules, vec!["high_accuracy_streak"]);
    }

    #[test]
    fn high_accuracy_streak_does_not_fire_at_hard() {
        let adapter = DifficultyAdapter::default();
        // Varied accuracy keeps the plateau rule quiet.
        let mut window = repeated(90.0, 1.0, 3, 2);
        window.push(snapshot(95.0, 1.0, 3));
        let decision = adapter.decide(&window, DifficultyTier::Hard);
        assert_eq!(decision.next_tier, DifficultyTier::Hard);
        assert!(decision.triggered_rules.is_empty());
    }

    #[test]
    fn low_accuracy_streak_deescalates() {
        let adapter = DifficultyAdapter::default();
        let window = repeated(40.0, 0.9, 3, 3);
        let decision = adapter.decide(&window, DifficultyTier::Medium);
        assert_eq!(decision.next_tier, DifficultyTier::Easy);
        assert_eq!(decision.triggered_rules, vec!["low_accuracy_streak"]);
    }

    #[test]
    fn interrupted_streak_does_not_fire() {
        let adapter = DifficultyAdapter::default();
        let mut window = repeated(90.0, 1.0, 3, 2);
        window.push(snapshot(60.0, 1.0, 3));
        window.push(snapshot(92.0, 1.0, 3));
        let decision = adapter.decide(&window, DifficultyTier::Medium);
        assert_eq!(decision.next_tier, DifficultyTier::Medium);
    }

    #[test]
    fn fast_confident_streak_graduates_easy_items_only() {
        let adapter = DifficultyAdapter::default();
        let window = repeated(75.0, 1.8, 4, 3);
        let decision = adapter.decide(&window, DifficultyTier::Easy);
        assert_eq!(decision.next_tier, DifficultyTier::Medium);
        assert_eq!(decision.triggered_rules, vec!["fast_confident_streak"]);

        let unchanged = adapter.decide(&window, DifficultyTier::Medium);
        assert_ne!(unchanged.triggered_rules, vec!["fast_confident_streak"]);
    }

    #[test]
    fn slow_unsure_streak_softens_hard_items() {
        let adapter = DifficultyAdapter::default();
        let window = repeated(60.0, 0.5, 2, 3);
        let decision = adapter.decide(&window, DifficultyTier::Hard);
        assert_eq!(decision.next_tier, DifficultyTier::Medium);
        assert_eq!(decision.triggered_rules, vec!["slow_unsure_streak"]);
    }

    #[test]
    fn plateau_escalates_after_long_flat_stretch() {
        let adapter = DifficultyAdapter::default();
        // Accuracy hovers around 75: no streak rule applies, variance is low.
        let mut window = Vec::new();
        for i in 0..8 {
            let accuracy = if i % 2 == 0 { 74.0 } else { 76.0 };
            window.push(snapshot(accuracy, 1.0, 3));
        }
        let decision = adapter.decide(&window, DifficultyTier::Medium);
        assert_eq!(decision.next_tier, DifficultyTier::Hard);
        assert_eq!(decision.triggered_rules, vec!["plateau"]);
    }

    #[test]
    fn positive_trend_graduates_easy_item() {
        let adapter = DifficultyAdapter::default();
        // Climbing accuracy, below streak thresholds, high variance.
        let accuracies = [55.0, 60.0, 64.0, 70.0, 75.0, 80.0];
        let window: Vec<_> = accuracies
            .iter()
            .map(|&a| snapshot(a, 1.0, 3))
            .collect();
        let decision = adapter.decide(&window, DifficultyTier::Easy);
        assert_eq!(decision.next_tier, DifficultyTier::Medium);
        assert_eq!(decision.triggered_rules, vec!["positive_trend"]);
    }

    #[test]
    fn no_match_leaves_tier_unchanged() {
        let adapter = DifficultyAdapter::default();
        let window = vec![snapshot(70.0, 1.0, 3), snapshot(80.0, 1.1, 3)];
        let decision = adapter.decide(&window, DifficultyTier::Medium);
        assert_eq!(decision.next_tier, DifficultyTier::Medium);
        assert!(decision.triggered_rules.is_empty());
    }

    #[test]
    fn decisions_never_jump_two_tiers() {
        let adapter = DifficultyAdapter::default();
        let windows = [
            repeated(95.0, 2.5, 5, 10),
            repeated(20.0, 0.3, 1, 10),
            repeated(75.0, 1.0, 3, 10),
        ];
        for window in &windows {
            for tier in [
                DifficultyTier::Easy,
                DifficultyTier::Medium,
                DifficultyTier::Hard,
            ] {
                let decision = adapter.decide(window, tier);
                let jump =
                    (decision.next_tier.rank() as i8 - tier.rank() as i8).unsigned_abs();
                assert!(jump <= 1, "{:?} -> {:?}", tier, decision.next_tier);
            }
        }
    }

    #[test]
    fn decision_window_ignores_old_history() {
        let adapter = DifficultyAdapter::default();
        // 20 poor snapshots followed by 15 neutral ones: the poor run falls
        // outside the decision window.
        let mut window = repeated(30.0, 0.9, 3, 20);
        window.extend(repeated(75.0, 1.0, 3, DECISION_WINDOW));
        let decision = adapter.decide(&window, DifficultyTier::Medium);
        assert_ne!(decision.next_tier, DifficultyTier::Easy);
    }

    #[test]
    fn flow_score_is_bounded_and_signed() {
        let adapter = DifficultyAdapter::default();
        let engaged = repeated(85.0, 1.2, 4, 5);
        let frustrated = repeated(30.0, 0.4, 1, 5);
        let engaged_score = adapter.flow_score(&engaged);
        let frustrated_score = adapter.flow_score(&frustrated);

        assert!(engaged_score > 0.0 && engaged_score <= 100.0);
        assert!(frustrated_score < 0.0 && frustrated_score >= -100.0);
        assert_eq!(adapter.flow_score(&[]), 0.0);
    }

    #[test]
    fn flow_recommendation_thresholds() {
        let adapter = DifficultyAdapter::default();
        assert_eq!(adapter.recommend_from_flow(75.0), DifficultyTier::Hard);
        assert_eq!(adapter.recommend_from_flow(35.0), DifficultyTier::Medium);
        assert_eq!(adapter.recommend_from_flow(-10.0), DifficultyTier::Easy);
    }

    #[test]
    fn synthesized_tier_steps_at_most_one() {
        let adapter = DifficultyAdapter::default();
        let window = repeated(95.0, 1.2, 5, 10);
        let next = adapter.synthesize_tier(DifficultyTier::Easy, &window);
        assert_eq!(next, DifficultyTier::Medium);
    }

    #[test]
    fn slope_of_flat_series_is_zero() {
        let window = repeated(70.0, 1.0, 3, 6);
        assert!(accuracy_slope(&window).abs() < 1e-9);
        assert!(accuracy_variance(&window) < 1e-9);
    }
}
