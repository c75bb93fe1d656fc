//! Test fixtures and factory functions for creating test data.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use thai_lessons_backend::models::{ContentRef, DbProgress, ReviewItem};

/// Create a learner register request body.
pub fn register_request(name: Option<&str>) -> serde_json::Value {
    match name {
        Some(n) => json!({ "display_name": n }),
        None => json!({}),
    }
}

/// Create a start-session request body.
pub fn start_session_request(content: &[&str], due_only: bool) -> serde_json::Value {
    json!({ "content": content, "due_only": due_only })
}

/// Create an answer request body.
pub fn answer_request(difficulty: &str) -> serde_json::Value {
    json!({ "difficulty": difficulty })
}

/// Progress row for a vocabulary item due at `next_review_at`.
pub fn progress_row(
    learner_id: Uuid,
    vocabulary_id: i64,
    mastery_level: u8,
    next_review_at: DateTime<Utc>,
) -> DbProgress {
    let item = ReviewItem {
        mastery_level,
        next_review_at,
        ..ReviewItem::new(ContentRef::vocabulary(vocabulary_id), next_review_at)
    };
    DbProgress::from_review_item(learner_id, &item)
}

/// Offset from now in hours.
pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}
