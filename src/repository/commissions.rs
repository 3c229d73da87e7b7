//! Commissions repository

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        commission::{BookingCommission, CommissionPayment},
        enums::{CommissionKind, CommissionStatus},
    },
};

#[derive(Clone)]
pub struct CommissionsRepository {
    pool: Pool<Postgres>,
}

impl CommissionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get the commission attached to a booking, if any
    pub async fn get_by_booking(
        &self,
        salon_id: Uuid,
        booking_id: Uuid,
    ) -> AppResult<Option<BookingCommission>> {
        let row = sqlx::query_as::<_, BookingCommission>(
            "SELECT * FROM booking_commissions WHERE salon_id = $1 AND booking_id = $2",
        )
        .bind(salon_id)
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a commission unless one already exists for the booking.
    /// Returns None when another caller created it first; commission
    /// calculation is triggered from retried side effects and must be
    /// idempotent.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_if_absent(
        &self,
        conn: &mut PgConnection,
        salon_id: Uuid,
        booking_id: Uuid,
        amount: i64,
        currency: &str,
        status: CommissionStatus,
        kind: CommissionKind,
        percent_bps: Option<i32>,
    ) -> AppResult<Option<BookingCommission>> {
        let row = sqlx::query_as::<_, BookingCommission>(
            r#"
            INSERT INTO booking_commissions (
                id, salon_id, booking_id, amount, currency, status, kind, percent_bps
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (booking_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(salon_id)
        .bind(booking_id)
        .bind(amount)
        .bind(currency)
        .bind(status)
        .bind(kind)
        .bind(percent_bps)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Lock a commission row for a status transition
    pub async fn get_for_update(
        &self,
        conn: &mut PgConnection,
        salon_id: Uuid,
        id: Uuid,
    ) -> AppResult<BookingCommission> {
        sqlx::query_as::<_, BookingCommission>(
            "SELECT * FROM booking_commissions WHERE id = $1 AND salon_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(salon_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Commission {} not found", id)))
    }

    /// Set commission status
    pub async fn set_status(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        status: CommissionStatus,
    ) -> AppResult<BookingCommission> {
        let row = sqlx::query_as::<_, BookingCommission>(
            "UPDATE booking_commissions SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Record a payment against a commission
    pub async fn insert_payment(
        &self,
        conn: &mut PgConnection,
        salon_id: Uuid,
        commission_id: Uuid,
        amount: i64,
        provider: &str,
    ) -> AppResult<CommissionPayment> {
        let row = sqlx::query_as::<_, CommissionPayment>(
            r#"
            INSERT INTO commission_payments (id, salon_id, commission_id, amount, provider)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(salon_id)
        .bind(commission_id)
        .bind(amount)
        .bind(provider)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// List payments recorded against a commission
    pub async fn list_payments(
        &self,
        salon_id: Uuid,
        commission_id: Uuid,
    ) -> AppResult<Vec<CommissionPayment>> {
        let rows = sqlx::query_as::<_, CommissionPayment>(
            r#"
            SELECT * FROM commission_payments
            WHERE salon_id = $1 AND commission_id = $2
            ORDER BY created_at
            "#,
        )
        .bind(salon_id)
        .bind(commission_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
