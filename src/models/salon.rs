//! Salon (tenant) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::CommissionKind;

/// Salon tenant row, carrying the booking policy flags and commission policy
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Salon {
    pub id: uuid::Uuid,
    /// URL slug identifying the tenant
    pub slug: String,
    pub name: String,
    /// IANA timezone of the salon (e.g. "Europe/Paris")
    pub timezone: String,
    pub allow_online_booking: bool,
    /// Online bookings start confirmed instead of pending
    pub auto_confirm: bool,
    pub prevent_overlaps: bool,
    pub commission_kind: Option<CommissionKind>,
    pub commission_percent_bps: Option<i32>,
    pub commission_fixed_amount: Option<i64>,
    pub commission_minimum_fee: i64,
    /// Default country calling code for phone normalization
    pub default_country_code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
