//! Platform commission models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::{CommissionKind, CommissionStatus};

/// At most one commission per booking (unique on booking_id), computed from
/// the salon's policy when an online booking completes or is captured.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookingCommission {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub booking_id: Uuid,
    /// Amount in integer minor units
    pub amount: i64,
    pub currency: String,
    pub status: CommissionStatus,
    pub kind: CommissionKind,
    /// Percent rate snapshot in basis points, for percent-kind policies
    pub percent_bps: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment recorded against a commission
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CommissionPayment {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub commission_id: Uuid,
    pub amount: i64,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

/// Operator action on a commission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommissionAction {
    Accrue,
    Charge,
    Waive,
}

/// Operator commission transition request
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionCommissionRequest {
    pub action: CommissionAction,
}
