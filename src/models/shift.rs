//! Shift models (recurring weekly availability windows)

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Recurring weekly availability window for a staff member, expressed in the
/// salon's local civil time
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Shift {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub staff_id: Uuid,
    /// Day of week (0=Monday, 6=Sunday)
    pub day_of_week: i16,
    /// Local opening time
    pub start_time: NaiveTime,
    /// Local closing time
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Create shift request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateShift {
    /// Day of week (0=Monday, 6=Sunday)
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: i16,
    /// Opening time (HH:MM)
    pub start_time: String,
    /// Closing time (HH:MM)
    pub end_time: String,
}
