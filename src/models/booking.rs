//! Booking model and request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{BookingSource, BookingStatus, PaymentState};

/// Booking row. Service name, duration, price and currency are snapshots
/// taken at creation time; later catalog edits never alter them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub staff_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub source: BookingSource,
    pub payment_state: PaymentState,
    pub service_name: String,
    pub duration_minutes: i32,
    pub price: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create booking request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub staff_id: Uuid,
    /// Requested slot start instant (RFC 3339)
    pub start_at: DateTime<Utc>,
    pub source: Option<BookingSource>,
    /// Customer phone number, any common notation
    #[validate(length(min = 3, max = 32))]
    pub customer_phone: String,
    #[validate(length(min = 1, max = 128))]
    pub customer_name: String,
}

/// Reschedule request: change service, staff and/or time of a booking
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingRequest {
    pub service_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub start_at: Option<DateTime<Utc>>,
}

/// Query parameters for listing bookings
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListBookingsQuery {
    pub staff_id: Option<Uuid>,
    /// Only bookings starting at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only bookings starting before this instant
    pub to: Option<DateTime<Utc>>,
}
