//! Progress endpoints

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedLearner;
use crate::AppState;

/// GET /api/progress/due
pub async fn due(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Query(query): Query<DueQuery>,
) -> Result<Json<DueResponse>> {
    let limit = query.limit.unwrap_or(state.review_limit);
    let max_level = state.scheduler.max_level();

    let rows = state
        .db
        .get_due_progress(auth.learner_id, Utc::now(), i64::from(limit))
        .await?;

    Ok(Json(DueResponse {
        items: rows
            .iter()
            .filter_map(|row| row.to_review_item(max_level))
            .collect(),
    }))
}

/// GET /api/progress/summary
pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
) -> Result<Json<ProgressSummary>> {
    let levels = state
        .db
        .get_level_counts(auth.learner_id, Utc::now())
        .await?;

    Ok(Json(ProgressSummary::from_levels(
        &levels,
        state.scheduler.max_level(),
    )))
}
