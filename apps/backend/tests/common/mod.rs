//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helper functions for creating test data
//! - Authentication helpers
//!
//! # Requirements
//! Tests marked `#[ignore = "requires database"]` need a PostgreSQL database
//! (set DATABASE_URL env var).

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use uuid::Uuid;

use thai_lessons_backend::config::Config;
use thai_lessons_backend::db::Database;
use thai_lessons_backend::models::DbProgress;
use thai_lessons_backend::{build_router, AppState};

/// Test context containing database connection and test router.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context against a real database.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        Self::with_config(db, Self::config(&database_url, 1000))
    }

    /// Create a context whose pool never connects.
    ///
    /// Only usable for requests rejected before any query runs.
    pub fn offline(rate_limit_max_requests: u32) -> Self {
        let url = "postgres://offline@127.0.0.1:1/none";
        let db = Database::connect_lazy(url).expect("lazy pool");
        Self::with_config(db, Self::config(url, rate_limit_max_requests))
    }

    fn config(database_url: &str, rate_limit_max_requests: u32) -> Config {
        let max = rate_limit_max_requests.to_string();
        Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some(database_url.to_string()),
            "RATE_LIMIT_MAX_REQUESTS" => Some(max.clone()),
            _ => None,
        })
        .expect("valid test config")
    }

    fn with_config(db: Database, config: Config) -> Self {
        let state = AppState::new(db, &config);
        let db = state.db.clone();
        let app = build_router(state);
        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test learner and return its ID and token.
    pub async fn create_test_learner(&self, name: Option<&str>) -> (Uuid, String) {
        let (learner, token) = self
            .db
            .create_learner(name)
            .await
            .expect("Failed to create test learner");
        (learner.id, token)
    }

    /// Insert a progress row directly.
    pub async fn seed_progress(&self, progress: &DbProgress) {
        sqlx::query(
            r#"
            INSERT INTO user_progress (learner_id, content_kind, content_id, mastery_level,
                                       next_review_at, last_reviewed_at, correct_answers,
                                       total_attempts)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(progress.learner_id)
        .bind(&progress.content_kind)
        .bind(progress.content_id)
        .bind(progress.mastery_level)
        .bind(progress.next_review_at)
        .bind(progress.last_reviewed_at)
        .bind(progress.correct_answers)
        .bind(progress.total_attempts)
        .execute(self.db.pool())
        .await
        .expect("Failed to seed progress");
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value")
    }

    /// Clean up test data for a learner.
    pub async fn cleanup_learner(&self, learner_id: Uuid) {
        let _ = sqlx::query("DELETE FROM review_log WHERE learner_id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM user_progress WHERE learner_id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM learners WHERE id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;
    }
}
