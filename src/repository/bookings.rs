//! Bookings repository
//!
//! All mutating methods run against an explicit transaction connection. The
//! database exclusion constraint `bookings_no_overlap` is the authoritative
//! non-overlap guarantee; a rejected insert is translated into the same
//! typed error the application-level pre-check produces, so callers cannot
//! distinguish losing the race from failing the pre-check.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{violated_constraint, AppError, AppResult},
    models::{
        booking::{Booking, ListBookingsQuery},
        enums::{BookingSource, BookingStatus, PaymentState},
    },
};

/// Name of the exclusion constraint over (staff_id, [start_at, end_at)).
const NO_OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";

/// Message shared by the pre-check and the race-loser translation.
pub const SLOT_TAKEN: &str = "Requested time slot is not available";

/// Column set for a new booking, snapshots included
pub struct NewBooking {
    pub salon_id: Uuid,
    pub staff_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub source: BookingSource,
    pub service_name: String,
    pub duration_minutes: i32,
    pub price: i64,
    pub currency: String,
}

fn map_write_error(err: sqlx::Error) -> AppError {
    if violated_constraint(&err) == Some(NO_OVERLAP_CONSTRAINT) {
        AppError::SlotUnavailable(SLOT_TAKEN.to_string())
    } else {
        AppError::Database(err)
    }
}

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a booking by id
    pub async fn get_by_id(&self, salon_id: Uuid, id: Uuid) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 AND salon_id = $2")
            .bind(id)
            .bind(salon_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// List bookings of a salon, optionally filtered by staff and window
    pub async fn list(&self, salon_id: Uuid, query: &ListBookingsQuery) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE salon_id = $1
              AND ($2::uuid IS NULL OR staff_id = $2)
              AND ($3::timestamptz IS NULL OR start_at >= $3)
              AND ($4::timestamptz IS NULL OR start_at < $4)
            ORDER BY start_at
            "#,
        )
        .bind(salon_id)
        .bind(query.staff_id)
        .bind(query.from)
        .bind(query.to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Busy [start, end) intervals of a staff member within a window,
    /// restricted to calendar-holding statuses. Pure read for the
    /// availability calculator.
    pub async fn busy_intervals(
        &self,
        staff_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
        let rows: Vec<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT start_at, end_at FROM bookings
            WHERE staff_id = $1
              AND status IN ('pending', 'confirmed', 'done')
              AND start_at < $3 AND end_at > $2
            ORDER BY start_at
            "#,
        )
        .bind(staff_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Application-level overlap pre-check inside the write transaction.
    /// Fast, friendly error path; the exclusion constraint remains the
    /// guarantee.
    pub async fn overlap_exists(
        &self,
        conn: &mut PgConnection,
        staff_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        exclude_booking: Option<Uuid>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE staff_id = $1
                  AND status IN ('pending', 'confirmed', 'done')
                  AND start_at < $3 AND end_at > $2
                  AND ($4::uuid IS NULL OR id != $4)
            )
            "#,
        )
        .bind(staff_id)
        .bind(start_at)
        .bind(end_at)
        .bind(exclude_booking)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Insert a new booking. An exclusion-constraint rejection surfaces as
    /// SLOT_UNAVAILABLE.
    pub async fn insert(&self, conn: &mut PgConnection, b: NewBooking) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, salon_id, staff_id, service_id, customer_id,
                start_at, end_at, status, source,
                service_name, duration_minutes, price, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(b.salon_id)
        .bind(b.staff_id)
        .bind(b.service_id)
        .bind(b.customer_id)
        .bind(b.start_at)
        .bind(b.end_at)
        .bind(b.status)
        .bind(b.source)
        .bind(&b.service_name)
        .bind(b.duration_minutes)
        .bind(b.price)
        .bind(&b.currency)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_write_error)
    }

    /// Lock a booking row for a lifecycle or reschedule mutation
    pub async fn get_for_update(
        &self,
        conn: &mut PgConnection,
        salon_id: Uuid,
        id: Uuid,
    ) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE id = $1 AND salon_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(salon_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Reschedule a booking: move its window, staff and/or service, with
    /// fresh snapshot fields when the service changed.
    #[allow(clippy::too_many_arguments)]
    pub async fn reschedule(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        staff_id: Uuid,
        service_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        service_name: &str,
        duration_minutes: i32,
        price: i64,
        currency: &str,
    ) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET staff_id = $2, service_id = $3, start_at = $4, end_at = $5,
                service_name = $6, duration_minutes = $7, price = $8, currency = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(staff_id)
        .bind(service_id)
        .bind(start_at)
        .bind(end_at)
        .bind(service_name)
        .bind(duration_minutes)
        .bind(price)
        .bind(currency)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_write_error)
    }

    /// Set the booking status
    pub async fn set_status(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        status: BookingStatus,
    ) -> AppResult<Booking> {
        let row = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_write_error)?;
        Ok(row)
    }

    /// Refresh the cached derived payment state column
    pub async fn set_payment_state(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        state: PaymentState,
    ) -> AppResult<()> {
        sqlx::query("UPDATE bookings SET payment_state = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(state)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
