//! Idempotency keys repository
//!
//! The unique constraint on (salon_id, method, path, key) provides the
//! total order among concurrent requests sharing a key: exactly one insert
//! wins, the others observe the existing record.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{enums::IdempotencyStatus, idempotency::IdempotencyRecord},
};

#[derive(Clone)]
pub struct IdempotencyRepository {
    pool: Pool<Postgres>,
}

impl IdempotencyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Drop a FAILED or expired record for the scope so the client can
    /// retry with the same key and get a fresh attempt.
    pub async fn clear_retryable(
        &self,
        salon_id: Uuid,
        method: &str,
        path: &str,
        key: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM idempotency_keys
            WHERE salon_id = $1 AND method = $2 AND path = $3 AND key = $4
              AND (status = 'failed' OR expires_at < NOW())
            "#,
        )
        .bind(salon_id)
        .bind(method)
        .bind(path)
        .bind(key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Unique-constraint insert of an IN_PROGRESS record. Returns None when
    /// a concurrent duplicate already holds the key.
    pub async fn try_insert(
        &self,
        salon_id: Uuid,
        method: &str,
        path: &str,
        key: &str,
        fingerprint: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Option<IdempotencyRecord>> {
        let row = sqlx::query_as::<_, IdempotencyRecord>(
            r#"
            INSERT INTO idempotency_keys (
                id, salon_id, method, path, key, status, request_fingerprint, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, 'in_progress', $6, $7)
            ON CONFLICT ON CONSTRAINT idempotency_keys_scope_key DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(salon_id)
        .bind(method)
        .bind(path)
        .bind(key)
        .bind(fingerprint)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Fetch the record currently holding the scope, if any
    pub async fn get(
        &self,
        salon_id: Uuid,
        method: &str,
        path: &str,
        key: &str,
    ) -> AppResult<Option<IdempotencyRecord>> {
        let row = sqlx::query_as::<_, IdempotencyRecord>(
            r#"
            SELECT * FROM idempotency_keys
            WHERE salon_id = $1 AND method = $2 AND path = $3 AND key = $4
            "#,
        )
        .bind(salon_id)
        .bind(method)
        .bind(path)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Record the final outcome of the originating request
    pub async fn finish(
        &self,
        id: Uuid,
        status: IdempotencyStatus,
        response_status: i16,
        response_body: &serde_json::Value,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE idempotency_keys
            SET status = $2, response_status = $3, response_body = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(response_status)
        .bind(response_body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete all expired records; returns the number swept
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM idempotency_keys WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
