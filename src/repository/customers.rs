//! Customers repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::customer::Customer};

#[derive(Clone)]
pub struct CustomersRepository {
    pool: Pool<Postgres>,
}

impl CustomersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Find a customer by canonical phone or create one. Concurrent callers
    /// converge on the same row through the (salon_id, phone) unique key.
    pub async fn find_or_create(
        &self,
        salon_id: Uuid,
        phone: &str,
        display_name: &str,
    ) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, salon_id, phone, display_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (salon_id, phone) DO UPDATE SET display_name = EXCLUDED.display_name
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(salon_id)
        .bind(phone)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Get a customer by id
    pub async fn get_by_id(&self, salon_id: Uuid, id: Uuid) -> AppResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND salon_id = $2",
        )
        .bind(id)
        .bind(salon_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
