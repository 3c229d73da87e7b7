//! Payment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::PaymentStatus;

/// Payment provider name used for in-person settlement. Payments through
/// any other provider count as non-manual for commission auto-settlement.
pub const MANUAL_PROVIDER: &str = "manual";

/// A payment against a booking. Several rows may reference one booking
/// (deposits, partial payments, refunds).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub booking_id: Uuid,
    /// Amount in integer minor units
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub provider: String,
    pub provider_ref: Option<String>,
    pub checkout_reference: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Init payment response
#[derive(Debug, Serialize, ToSchema)]
pub struct InitPaymentResponse {
    pub payment_id: Uuid,
    /// Opaque reference the client hands to the payment provider checkout
    pub checkout_reference: String,
    pub amount: i64,
    pub currency: String,
}

/// Outcome reported by a payment provider webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Captured,
    Failed,
    Canceled,
    Refunded,
}

impl WebhookOutcome {
    pub fn target_status(&self) -> PaymentStatus {
        match self {
            WebhookOutcome::Captured => PaymentStatus::Paid,
            WebhookOutcome::Failed => PaymentStatus::Failed,
            WebhookOutcome::Canceled => PaymentStatus::Canceled,
            WebhookOutcome::Refunded => PaymentStatus::Refunded,
        }
    }
}

/// Payment provider webhook payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentWebhookRequest {
    /// Provider-unique event id; replays are acknowledged without effect
    pub event_id: String,
    pub payment_id: Uuid,
    pub outcome: WebhookOutcome,
    pub provider_ref: Option<String>,
}
