//! Shifts repository (recurring weekly availability windows)
//!
//! The scheduling core treats this table as read-only; the write methods
//! exist for salon configuration.

use chrono::NaiveTime;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::shift::Shift,
};

#[derive(Clone)]
pub struct ShiftsRepository {
    pool: Pool<Postgres>,
}

impl ShiftsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List active shifts for a staff member, ordered by day and start time
    pub async fn list_active(&self, salon_id: Uuid, staff_id: Uuid) -> AppResult<Vec<Shift>> {
        let rows = sqlx::query_as::<_, Shift>(
            r#"
            SELECT * FROM shifts
            WHERE salon_id = $1 AND staff_id = $2 AND is_active
            ORDER BY day_of_week, start_time
            "#,
        )
        .bind(salon_id)
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Transaction-scoped variant used by the booking writer
    pub async fn list_active_tx(
        &self,
        conn: &mut PgConnection,
        salon_id: Uuid,
        staff_id: Uuid,
    ) -> AppResult<Vec<Shift>> {
        let rows = sqlx::query_as::<_, Shift>(
            r#"
            SELECT * FROM shifts
            WHERE salon_id = $1 AND staff_id = $2 AND is_active
            ORDER BY day_of_week, start_time
            "#,
        )
        .bind(salon_id)
        .bind(staff_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Create a shift
    pub async fn create(
        &self,
        salon_id: Uuid,
        staff_id: Uuid,
        day_of_week: i16,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> AppResult<Shift> {
        let row = sqlx::query_as::<_, Shift>(
            r#"
            INSERT INTO shifts (id, salon_id, staff_id, day_of_week, start_time, end_time, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(salon_id)
        .bind(staff_id)
        .bind(day_of_week)
        .bind(start_time)
        .bind(end_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Deactivate a shift (kept for audit, removed from availability)
    pub async fn deactivate(&self, salon_id: Uuid, id: Uuid) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE shifts SET is_active = FALSE WHERE id = $1 AND salon_id = $2")
                .bind(id)
                .bind(salon_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Shift {} not found", id)));
        }
        Ok(())
    }
}
