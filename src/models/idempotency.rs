//! Idempotency key record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::IdempotencyStatus;

/// Persistent idempotency record, unique on (salon_id, method, path, key)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdempotencyRecord {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub method: String,
    pub path: String,
    pub key: String,
    pub status: IdempotencyStatus,
    /// SHA-256 of the normalized request body
    pub request_fingerprint: String,
    pub response_status: Option<i16>,
    pub response_body: Option<serde_json::Value>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
