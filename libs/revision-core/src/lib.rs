//! Core revision-scheduling library shared by the backend service.
//!
//! Provides:
//! - Interval/ease-factor scheduling with difficulty-tiered ladders and an
//!   exam-aware blend (SM-2 lineage)
//! - Performance-driven difficulty adaptation (ordered rule table plus a
//!   flow-state score)
//! - Forgetting-curve retention prediction and exam readiness
//! - Daily schedule construction (prioritized, time-boxed sessions)
//!
//! Everything here is synchronous and side-effect free; persistence and
//! transport live in the consuming service.

pub mod adapter;
pub mod error;
pub mod retention;
pub mod schedule;
pub mod scheduler;
pub mod types;

pub use adapter::{AdaptationRule, DifficultyAdapter, TierDecision, DECISION_WINDOW};
pub use error::{Result, SchedulerError};
pub use retention::{RetentionModel, RetentionPoint, FORGETTING_HORIZONS_HOURS};
pub use schedule::{ExamProximity, ScheduleBuilder};
pub use scheduler::{IntervalScheduler, ReviewOutcome};
pub use types::{
    ContentType, DifficultyTier, ImportanceTier, MasteryLevel, PerformanceSnapshot, Rating,
    ReviewEvent, RevisionItem, ScheduleSession, SessionType, StudyPreferences,
};
