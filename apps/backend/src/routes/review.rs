//! Review session endpoints

use std::collections::HashSet;
use std::time::Instant;

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use progress_core::{SessionOptions, SessionRunner};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedLearner;
use crate::AppState;

fn no_session() -> ApiError {
    ApiError::NotFound("No active review session".to_string())
}

/// POST /api/review/session
///
/// Builds the working set from the listed content plus everything already due.
pub async fn start(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    payload: Option<Json<StartSessionRequest>>,
) -> Result<Json<SessionResponse>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    if payload.content.len() > state.review_limit as usize {
        return Err(ApiError::BadRequest(format!(
            "At most {} content refs per session",
            state.review_limit
        )));
    }

    let refs = payload
        .content
        .iter()
        .map(|s| s.parse::<ContentRef>())
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let now = Utc::now();
    let max_level = state.scheduler.max_level();

    let listed = state.db.get_progress(auth.learner_id, &refs).await?;
    let due = state
        .db
        .get_due_progress(auth.learner_id, now, i64::from(state.review_limit))
        .await?;

    let mut seen = HashSet::new();
    let persisted: Vec<ReviewItem> = listed
        .iter()
        .chain(due.iter())
        .filter_map(|row| row.to_review_item(max_level))
        .filter(|item| seen.insert(item.content_ref))
        .collect();

    let options = SessionOptions {
        due_only: payload.due_only,
        limit: payload.limit,
    };
    let runner = SessionRunner::with_options(
        state.scheduler.as_ref().clone(),
        persisted,
        refs,
        now,
        options,
    );

    tracing::info!(
        learner_id = %auth.learner_id,
        items = runner.items().len(),
        "started review session"
    );

    let response = SessionResponse::from(&runner);
    state.sessions.start(auth.learner_id, runner, Instant::now());
    Ok(Json(response))
}

/// GET /api/review/session
pub async fn current(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
) -> Result<Json<SessionResponse>> {
    let session = state
        .sessions
        .get(auth.learner_id, Instant::now())
        .ok_or_else(no_session)?;
    let runner = session.lock().await;
    Ok(Json(SessionResponse::from(&*runner)))
}

/// POST /api/review/answer
///
/// The session only advances once the answer is stored, so a failed write
/// can be retried against the same item.
pub async fn answer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>> {
    let difficulty: Difficulty = payload.difficulty.parse()?;
    let now = Utc::now();

    let session = state
        .sessions
        .get(auth.learner_id, Instant::now())
        .ok_or_else(no_session)?;
    let mut runner = session.lock().await;

    let level_before = runner.current_item().map_or(0, |item| item.mastery_level);
    let outcome = runner.preview_answer(difficulty, now)?;

    let progress = DbProgress::from_review_item(auth.learner_id, &outcome.item);
    let log = DbReviewLog {
        id: Uuid::new_v4(),
        learner_id: auth.learner_id,
        content_kind: progress.content_kind.clone(),
        content_id: progress.content_id,
        difficulty: difficulty.as_str().to_string(),
        level_before: i32::from(level_before),
        level_after: i32::from(outcome.result.new_level),
        interval_days: i32::try_from(outcome.result.interval_days).unwrap_or(i32::MAX),
        reviewed_at: now,
    };
    state.db.record_answer(&progress, &log).await?;

    runner.commit_answer(&outcome)?;

    Ok(Json(AnswerResponse {
        next_review_at: outcome.result.next_review_at,
        interval_days: outcome.result.interval_days,
        current: runner.current_item().cloned(),
        item: outcome.item,
        stats: outcome.stats,
        is_complete: outcome.is_complete,
    }))
}

/// DELETE /api/review/session
pub async fn end(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
) -> Result<Json<EndSessionResponse>> {
    let session = state.sessions.end(auth.learner_id).ok_or_else(no_session)?;
    let stats = session.lock().await.stats();

    tracing::info!(
        learner_id = %auth.learner_id,
        reviewed = stats.reviewed,
        correct = stats.correct,
        total = stats.total,
        "ended review session"
    );

    Ok(Json(EndSessionResponse {
        accuracy: stats.accuracy(),
        stats,
    }))
}
