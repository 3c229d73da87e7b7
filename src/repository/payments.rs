//! Payments repository

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::PaymentStatus,
        payment::{Payment, MANUAL_PROVIDER},
    },
};

#[derive(Clone)]
pub struct PaymentsRepository {
    pool: Pool<Postgres>,
}

impl PaymentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a payment by id
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", id)))
    }

    /// List a booking's payments, oldest first
    pub async fn list_for_booking(&self, salon_id: Uuid, booking_id: Uuid) -> AppResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE salon_id = $1 AND booking_id = $2 ORDER BY created_at",
        )
        .bind(salon_id)
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create an INITIATED payment for a provider checkout
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_initiated(
        &self,
        conn: &mut PgConnection,
        salon_id: Uuid,
        booking_id: Uuid,
        amount: i64,
        currency: &str,
        provider: &str,
        checkout_reference: &str,
        idempotency_key: Option<&str>,
    ) -> AppResult<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                id, salon_id, booking_id, amount, currency, status,
                provider, checkout_reference, idempotency_key
            )
            VALUES ($1, $2, $3, $4, $5, 'initiated', $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(salon_id)
        .bind(booking_id)
        .bind(amount)
        .bind(currency)
        .bind(provider)
        .bind(checkout_reference)
        .bind(idempotency_key)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Lock a payment row for a status transition
    pub async fn get_for_update(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", id)))
    }

    /// Set payment status and provider reference
    pub async fn set_status(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        status: PaymentStatus,
        provider_ref: Option<&str>,
    ) -> AppResult<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = $2, provider_ref = COALESCE($3, provider_ref), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(provider_ref)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Full (status, amount) ledger of a booking, read inside the
    /// transaction that mutates it so the derived state cannot drift.
    pub async fn ledger(
        &self,
        conn: &mut PgConnection,
        booking_id: Uuid,
    ) -> AppResult<Vec<(PaymentStatus, i64)>> {
        let rows: Vec<(PaymentStatus, i64)> =
            sqlx::query_as("SELECT status, amount FROM payments WHERE booking_id = $1")
                .bind(booking_id)
                .fetch_all(&mut *conn)
                .await?;
        Ok(rows)
    }

    /// Whether the booking has a captured payment through a non-manual
    /// provider (commission auto-settlement gate)
    pub async fn has_non_manual_paid(&self, booking_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM payments
                WHERE booking_id = $1 AND status = 'paid' AND provider != $2
            )
            "#,
        )
        .bind(booking_id)
        .bind(MANUAL_PROVIDER)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Record a provider webhook event exactly once. Returns false when the
    /// event id was already seen (replay).
    pub async fn record_event_once(
        &self,
        conn: &mut PgConnection,
        provider: &str,
        event_id: &str,
        payment_id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_events (provider, event_id, payment_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (provider, event_id) DO NOTHING
            "#,
        )
        .bind(provider)
        .bind(event_id)
        .bind(payment_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
