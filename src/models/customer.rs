//! Customer model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Salon customer, keyed by canonical international phone number
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub salon_id: Uuid,
    /// Phone in canonical +<digits> form
    pub phone: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}
