//! Error types for progress-core.

use thiserror::Error;

use crate::types::ContentRef;

/// Result type alias using ProgressError.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Errors raised by the interval table, parsers and the session runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("interval table is empty")]
    EmptyIntervalTable,

    #[error("interval table has {len} entries, at most {max} are supported")]
    IntervalTableTooLong { len: usize, max: usize },

    #[error("interval at level {level} must be at least one day")]
    NonPositiveInterval { level: usize },

    #[error("interval at level {level} is {days} days, at most {max} are supported")]
    IntervalTooLong { level: usize, days: u32, max: u32 },

    #[error("interval at level {level} is shorter than the one before it")]
    DecreasingInterval { level: usize },

    #[error("invalid interval value: {0}")]
    InvalidInterval(String),

    #[error("unknown difficulty: {0}")]
    InvalidDifficulty(String),

    #[error("invalid content reference: {0}")]
    InvalidContentRef(String),

    #[error("session has no items to review")]
    EmptySession,

    #[error("session already complete after {reviewed} reviews")]
    SessionComplete { reviewed: u32 },

    #[error("answer for {0} does not match the current item")]
    StaleAnswer(ContentRef),
}

impl ProgressError {
    /// True for errors caused by driving a session past its end.
    pub fn is_session_state(&self) -> bool {
        matches!(
            self,
            Self::EmptySession | Self::SessionComplete { .. } | Self::StaleAnswer(_)
        )
    }
}
