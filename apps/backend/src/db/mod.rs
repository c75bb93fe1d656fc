//! PostgreSQL database operations

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{postgres::PgPoolOptions, PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

/// Hash a bearer token for storage and lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a pool that connects on first use
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Learner Repository ===

    /// Create a new learner, returning it together with its bearer token
    pub async fn create_learner(&self, display_name: Option<&str>) -> Result<(Learner, String)> {
        let token = Uuid::new_v4().to_string();
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            INSERT INTO learners (token_hash, display_name)
            VALUES ($1, $2)
            RETURNING id, display_name, created_at, last_seen_at
            "#,
        )
        .bind(hash_token(&token))
        .bind(display_name)
        .fetch_one(&self.pool)
        .await?;

        Ok((learner, token))
    }

    /// Get learner by bearer token
    pub async fn get_learner_by_token(&self, token: &str) -> Result<Option<Learner>> {
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            SELECT id, display_name, created_at, last_seen_at
            FROM learners
            WHERE token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(learner)
    }

    /// Get learner by ID
    pub async fn get_learner(&self, learner_id: Uuid) -> Result<Option<Learner>> {
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            SELECT id, display_name, created_at, last_seen_at
            FROM learners
            WHERE id = $1
            "#,
        )
        .bind(learner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(learner)
    }

    /// Update learner last_seen_at timestamp
    pub async fn update_last_seen(&self, learner_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE learners
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(learner_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Progress Repository ===

    /// Get persisted progress for the given content items
    pub async fn get_progress(
        &self,
        learner_id: Uuid,
        refs: &[ContentRef],
    ) -> Result<Vec<DbProgress>> {
        if refs.is_empty() {
            return Ok(Vec::new());
        }

        let kinds: Vec<String> = refs.iter().map(|r| r.kind.as_str().to_string()).collect();
        let ids: Vec<i64> = refs.iter().map(|r| r.id).collect();

        let rows = sqlx::query_as::<_, DbProgress>(
            r#"
            SELECT p.learner_id, p.content_kind, p.content_id, p.mastery_level,
                   p.next_review_at, p.last_reviewed_at, p.correct_answers,
                   p.total_attempts, p.updated_at
            FROM user_progress p
            JOIN UNNEST($2::text[], $3::bigint[]) AS wanted(kind, id)
              ON p.content_kind = wanted.kind AND p.content_id = wanted.id
            WHERE p.learner_id = $1
            ORDER BY p.next_review_at
            "#,
        )
        .bind(learner_id)
        .bind(&kinds)
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Get progress rows due at `now`, earliest first
    pub async fn get_due_progress(
        &self,
        learner_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<DbProgress>> {
        let rows = sqlx::query_as::<_, DbProgress>(
            r#"
            SELECT learner_id, content_kind, content_id, mastery_level,
                   next_review_at, last_reviewed_at, correct_answers,
                   total_attempts, updated_at
            FROM user_progress
            WHERE learner_id = $1 AND next_review_at <= $2
            ORDER BY next_review_at, content_kind, content_id
            LIMIT $3
            "#,
        )
        .bind(learner_id)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Store an answered item and its review log row in one transaction
    pub async fn record_answer(&self, progress: &DbProgress, log: &DbReviewLog) -> Result<()> {
        let mut transaction = self.pool.begin().await?;

        upsert_progress_with(&mut *transaction, progress).await?;
        insert_review_log_with(&mut *transaction, log).await?;

        transaction.commit().await?;
        Ok(())
    }

    /// Per-level counts for the progress summary
    pub async fn get_level_counts(
        &self,
        learner_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<LevelCount>> {
        let rows = sqlx::query_as::<_, LevelCount>(
            r#"
            SELECT mastery_level,
                   COUNT(*) AS items,
                   COUNT(*) FILTER (WHERE next_review_at <= $2) AS due,
                   COALESCE(SUM(correct_answers), 0)::bigint AS correct_answers,
                   COALESCE(SUM(total_attempts), 0)::bigint AS total_attempts
            FROM user_progress
            WHERE learner_id = $1
            GROUP BY mastery_level
            ORDER BY mastery_level
            "#,
        )
        .bind(learner_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// === Shared queries ===

/// Upsert progress keyed by learner and content item
async fn upsert_progress_with<'e, E>(executor: E, progress: &DbProgress) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO user_progress (learner_id, content_kind, content_id, mastery_level,
                                   next_review_at, last_reviewed_at, correct_answers,
                                   total_attempts, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        ON CONFLICT (learner_id, content_kind, content_id) DO UPDATE SET
            mastery_level = EXCLUDED.mastery_level,
            next_review_at = EXCLUDED.next_review_at,
            last_reviewed_at = EXCLUDED.last_reviewed_at,
            correct_answers = EXCLUDED.correct_answers,
            total_attempts = EXCLUDED.total_attempts,
            updated_at = NOW()
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
    .execute(executor)
    .await?;

    Ok(())
}

/// Insert a review history record
async fn insert_review_log_with<'e, E>(executor: E, log: &DbReviewLog) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO review_log (id, learner_id, content_kind, content_id, difficulty,
                                level_before, level_after, interval_days, reviewed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(log.id)
    .bind(log.learner_id)
    .bind(&log.content_kind)
    .bind(log.content_id)
    .bind(&log.difficulty)
    .bind(log.level_before)
    .bind(log.level_after)
    .bind(log.interval_days)
    .bind(log.reviewed_at)
    .execute(executor)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = hash_token("secret");
        assert_eq!(a, hash_token("secret"));
        assert_ne!(a, hash_token("Secret"));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
