//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from progress-core
pub use progress_core::types::{ContentKind, ContentRef, Difficulty, ReviewItem, SessionStats};
use progress_core::SessionRunner;

// === Database Entity Types ===

/// Registered learner
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Learner {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Progress row in PostgreSQL, one per learner and content item
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbProgress {
    pub learner_id: Uuid,
    pub content_kind: String,
    pub content_id: i64,
    pub mastery_level: i32,
    pub next_review_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub correct_answers: i32,
    pub total_attempts: i32,
    pub updated_at: DateTime<Utc>,
}

impl DbProgress {
    /// Create from a progress-core ReviewItem
    pub fn from_review_item(learner_id: Uuid, item: &ReviewItem) -> Self {
        Self {
            learner_id,
            content_kind: item.content_ref.kind.as_str().to_string(),
            content_id: item.content_ref.id,
            mastery_level: i32::from(item.mastery_level),
            next_review_at: item.next_review_at,
            last_reviewed_at: item.last_reviewed_at,
            correct_answers: clamp_to_i32(item.correct_answers),
            total_attempts: clamp_to_i32(item.total_attempts),
            updated_at: Utc::now(),
        }
    }

    /// Convert to a progress-core ReviewItem, repairing out-of-range values.
    ///
    /// Returns `None` for rows with an unknown content kind.
    pub fn to_review_item(&self, max_level: u8) -> Option<ReviewItem> {
        let Some(kind) = ContentKind::parse_kind(&self.content_kind) else {
            tracing::warn!(
                learner_id = %self.learner_id,
                content_kind = %self.content_kind,
                content_id = self.content_id,
                "skipping progress row with unknown content kind"
            );
            return None;
        };
        let content_ref = ContentRef::new(kind, self.content_id);

        let item = ReviewItem {
            content_ref,
            mastery_level: level_from_db(content_ref, self.mastery_level),
            next_review_at: self.next_review_at,
            last_reviewed_at: self.last_reviewed_at,
            correct_answers: count_from_db(content_ref, "correct_answers", self.correct_answers),
            total_attempts: count_from_db(content_ref, "total_attempts", self.total_attempts),
        };
        Some(item.sanitized(max_level))
    }
}

fn clamp_to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn level_from_db(content_ref: ContentRef, level: i32) -> u8 {
    match u8::try_from(level) {
        Ok(level) => level,
        Err(_) => {
            tracing::warn!(content = %content_ref, mastery_level = level, "mastery level out of range, clamping");
            if level < 0 {
                0
            } else {
                u8::MAX
            }
        }
    }
}

fn count_from_db(content_ref: ContentRef, field: &'static str, value: i32) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| {
        tracing::warn!(content = %content_ref, field, value, "negative counter, resetting to zero");
        0
    })
}

/// Review history record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReviewLog {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub content_kind: String,
    pub content_id: i64,
    pub difficulty: String,
    pub level_before: i32,
    pub level_after: i32,
    pub interval_days: i32,
    pub reviewed_at: DateTime<Utc>,
}

/// Per-level aggregate used to build the progress summary
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LevelCount {
    pub mastery_level: i32,
    pub items: i64,
    pub due: i64,
    pub correct_answers: i64,
    pub total_attempts: i64,
}

// === API Request/Response Types ===

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LearnerRegisterRequest {
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerRegisterResponse {
    pub learner_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerStatusResponse {
    pub learner_id: Uuid,
    pub display_name: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueResponse {
    pub items: Vec<ReviewItem>,
}

/// Learner-wide progress overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub tracked: i64,
    pub due_now: i64,
    /// Items at the highest mastery level.
    pub mastered: i64,
    /// Item count per mastery level, index = level.
    pub by_level: Vec<i64>,
    pub correct_answers: i64,
    pub total_attempts: i64,
    pub accuracy: Option<f64>,
}

impl ProgressSummary {
    /// Fold per-level aggregates; levels past `max_level` land in the top bucket.
    pub fn from_levels(levels: &[LevelCount], max_level: u8) -> Self {
        let mut by_level = vec![0_i64; usize::from(max_level) + 1];
        let mut summary = Self {
            tracked: 0,
            due_now: 0,
            mastered: 0,
            by_level: Vec::new(),
            correct_answers: 0,
            total_attempts: 0,
            accuracy: None,
        };

        for row in levels {
            let index = usize::try_from(row.mastery_level.max(0))
                .unwrap_or(0)
                .min(usize::from(max_level));
            by_level[index] += row.items;
            summary.tracked += row.items;
            summary.due_now += row.due;
            summary.correct_answers += row.correct_answers;
            summary.total_attempts += row.total_attempts;
        }

        summary.mastered = by_level[usize::from(max_level)];
        summary.by_level = by_level;
        if summary.total_attempts > 0 {
            summary.accuracy = Some(summary.correct_answers as f64 / summary.total_attempts as f64);
        }
        summary
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StartSessionRequest {
    /// Content refs in `kind:id` form, e.g. `vocabulary:12`.
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub due_only: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub current: Option<ReviewItem>,
    pub stats: SessionStats,
    pub remaining: usize,
    pub is_complete: bool,
}

impl From<&SessionRunner> for SessionResponse {
    fn from(session: &SessionRunner) -> Self {
        Self {
            current: session.current_item().cloned(),
            stats: session.stats(),
            remaining: session.remaining(),
            is_complete: session.is_complete(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub difficulty: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub item: ReviewItem,
    pub interval_days: u32,
    pub next_review_at: DateTime<Utc>,
    pub stats: SessionStats,
    pub is_complete: bool,
    pub current: Option<ReviewItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub stats: SessionStats,
    pub accuracy: Option<f64>,
}
