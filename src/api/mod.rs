//! API handlers for Bookline REST endpoints

pub mod availability;
pub mod bookings;
pub mod commissions;
pub mod health;
pub mod openapi;
pub mod payments;
pub mod shifts;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, services::idempotency::validate_key};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Extractor for the client-supplied idempotency key required on mutating
/// booking and payment endpoints
pub struct IdempotencyKey(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .ok_or_else(|| {
                AppError::Validation(format!("Missing {} header", IDEMPOTENCY_KEY_HEADER))
            })?
            .to_str()
            .map_err(|_| {
                AppError::Validation(format!("Invalid {} header", IDEMPOTENCY_KEY_HEADER))
            })?;
        validate_key(value)?;
        Ok(IdempotencyKey(value.to_string()))
    }
}
