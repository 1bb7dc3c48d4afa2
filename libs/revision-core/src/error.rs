//! Error types for revision-core.

use thiserror::Error;

/// Result type alias using SchedulerError.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors raised by the scheduling core.
///
/// All variants are caller errors; a malformed review event is rejected
/// before any state transition is computed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("confidence must be between 1 and 5, got {value}")]
    InvalidConfidence { value: u8 },

    #[error("time spent must be between 1 and {max} seconds, got {seconds}")]
    InvalidTimeSpent { seconds: u32, max: u32 },

    #[error("hints used must not exceed {max}, got {count}")]
    InvalidHintsUsed { count: u32, max: u32 },
}
