//! Progress tracking core shared by the lesson backend.
//!
//! Provides:
//! - Interval table mapping mastery levels to review intervals
//! - Scheduler turning easy/medium/hard judgments into the next due date
//! - Session runner walking a learner's working set earliest-due first
//! - Shared types (ReviewItem, ContentRef, Difficulty, SessionStats)

pub mod error;
pub mod scheduler;
pub mod session;
pub mod types;

pub use error::{ProgressError, Result};
pub use scheduler::{
    IntervalTable, Scheduler, SchedulingResult, DEFAULT_INTERVAL_DAYS, MAX_INTERVAL_DAYS,
};
pub use session::{AnswerOutcome, SessionOptions, SessionRunner};
pub use types::{ContentKind, ContentRef, Difficulty, ReviewItem, SessionStats};
