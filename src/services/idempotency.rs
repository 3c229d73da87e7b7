//! Idempotency key coordinator
//!
//! Guarantees at-most-one logical execution per client key scoped to
//! (method, normalized path, tenant). First sight inserts an IN_PROGRESS
//! record through the unique constraint; concurrent duplicates lose the
//! insert and are rejected as in-progress. Completed outcomes in the
//! 2xx-4xx range are cached and replayed verbatim; 5xx outcomes mark the
//! record FAILED so the client can retry the same key.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::future::Future;
use uuid::Uuid;

use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
    models::enums::IdempotencyStatus,
    repository::Repository,
};

const MAX_KEY_LENGTH: usize = 255;

/// SHA-256 fingerprint of the normalized request body. serde_json maps are
/// key-ordered, so semantically equal payloads hash equal.
pub fn fingerprint(payload: &Value) -> String {
    let canonical = payload.to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize the request path component of the scope
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Validate a client-supplied idempotency key before any ledger touch
pub fn validate_key(key: &str) -> AppResult<()> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(AppError::Validation(format!(
            "Idempotency key must be 1-{} characters",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

/// Handle to an IN_PROGRESS record held by the originating request
pub struct Ticket {
    record_id: Uuid,
}

/// Outcome of claiming an idempotency key
pub enum Begin {
    /// First execution: proceed, then call `complete` with the outcome
    Fresh(Ticket),
    /// Key already completed with an identical payload: replay the cached
    /// response verbatim
    Replay { status: StatusCode, body: Value },
}

#[derive(Clone)]
pub struct IdempotencyService {
    repository: Repository,
    ttl: Duration,
}

impl IdempotencyService {
    pub fn new(repository: Repository, config: &BookingConfig) -> Self {
        Self {
            repository,
            ttl: Duration::hours(config.idempotency_ttl_hours),
        }
    }

    /// Claim the key for this scope or resolve what to do instead.
    pub async fn begin(
        &self,
        salon_id: Uuid,
        method: &str,
        path: &str,
        key: &str,
        request_fingerprint: &str,
    ) -> AppResult<Begin> {
        validate_key(key)?;
        let path = normalize_path(path);
        let method = method.to_uppercase();

        // FAILED and expired records yield a fresh attempt
        self.repository
            .idempotency
            .clear_retryable(salon_id, &method, &path, key)
            .await?;

        let expires_at = Utc::now() + self.ttl;
        if let Some(record) = self
            .repository
            .idempotency
            .try_insert(salon_id, &method, &path, key, request_fingerprint, expires_at)
            .await?
        {
            return Ok(Begin::Fresh(Ticket {
                record_id: record.id,
            }));
        }

        // Lost the unique insert: somebody holds the key
        let existing = self
            .repository
            .idempotency
            .get(salon_id, &method, &path, key)
            .await?;
        match existing {
            Some(record) if record.status == IdempotencyStatus::Completed => {
                if record.request_fingerprint != request_fingerprint {
                    return Err(AppError::IdempotencyConflict(
                        "Idempotency key reused with a different payload".to_string(),
                    ));
                }
                let status = record
                    .response_status
                    .and_then(|s| StatusCode::from_u16(s as u16).ok())
                    .ok_or_else(|| {
                        AppError::Internal("Completed idempotency record without response".into())
                    })?;
                let body = record.response_body.unwrap_or(Value::Null);
                Ok(Begin::Replay { status, body })
            }
            // IN_PROGRESS, or the record vanished between insert and read:
            // either way a duplicate is in flight right now
            _ => Err(AppError::IdempotencyInProgress),
        }
    }

    /// Record the final outcome. 2xx-4xx outcomes are client-visible and
    /// cached for replay; 5xx outcomes are retryable and mark the record
    /// FAILED. Bookkeeping failures are logged, never surfaced.
    pub async fn complete(&self, ticket: Ticket, status: StatusCode, body: &Value) {
        let record_status = if status.is_server_error() {
            IdempotencyStatus::Failed
        } else {
            IdempotencyStatus::Completed
        };
        if let Err(e) = self
            .repository
            .idempotency
            .finish(ticket.record_id, record_status, status.as_u16() as i16, body)
            .await
        {
            tracing::error!("Failed to record idempotency outcome: {}", e);
        }
    }

    /// Run a mutating operation under idempotency control. The operation
    /// yields the response (status, body) it wants cached and replayed.
    pub async fn run<F, Fut>(
        &self,
        salon_id: Uuid,
        method: &str,
        path: &str,
        key: &str,
        payload: &Value,
        op: F,
    ) -> AppResult<(StatusCode, Value)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<(StatusCode, Value)>>,
    {
        let request_fingerprint = fingerprint(payload);
        let ticket = match self
            .begin(salon_id, method, path, key, &request_fingerprint)
            .await?
        {
            Begin::Replay { status, body } => return Ok((status, body)),
            Begin::Fresh(ticket) => ticket,
        };

        let outcome = op().await;
        let (status, body) = match &outcome {
            Ok((status, body)) => (*status, body.clone()),
            Err(e) => (e.status_code(), e.response_body()),
        };
        self.complete(ticket, status, &body).await;
        outcome
    }

    /// Delete expired records
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        self.repository.idempotency.sweep_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_is_stable_for_equal_payloads() {
        let a = json!({"staff_id": "a", "start_at": "2025-06-02T09:00:00Z"});
        let b = json!({"start_at": "2025-06-02T09:00:00Z", "staff_id": "a"});
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_differs_for_different_payloads() {
        let a = json!({"start_at": "2025-06-02T09:00:00Z"});
        let b = json!({"start_at": "2025-06-02T09:15:00Z"});
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/salons/x/bookings/"), "/salons/x/bookings");
        assert_eq!(normalize_path("/salons/x/bookings"), "/salons/x/bookings");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_validate_key_bounds() {
        assert!(validate_key("k").is_ok());
        assert!(validate_key(&"x".repeat(255)).is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key(&"x".repeat(256)).is_err());
    }
}
