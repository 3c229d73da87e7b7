//! Salons repository: tenant resolution and catalog lookups

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        catalog::{Service, Staff},
        salon::Salon,
    },
};

#[derive(Clone)]
pub struct SalonsRepository {
    pool: Pool<Postgres>,
}

impl SalonsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Resolve an active tenant by slug
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<Salon> {
        sqlx::query_as::<_, Salon>("SELECT * FROM salons WHERE slug = $1 AND is_active")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Salon '{}' not found", slug)))
    }

    /// Get a salon by id
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Salon> {
        sqlx::query_as::<_, Salon>("SELECT * FROM salons WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Salon {} not found", id)))
    }

    /// Get an active service of a salon
    pub async fn get_service(&self, salon_id: Uuid, service_id: Uuid) -> AppResult<Service> {
        sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE id = $1 AND salon_id = $2 AND is_active",
        )
        .bind(service_id)
        .bind(salon_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Service {} not found", service_id)))
    }

    /// Get an active staff member of a salon
    pub async fn get_staff(&self, salon_id: Uuid, staff_id: Uuid) -> AppResult<Staff> {
        sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE id = $1 AND salon_id = $2 AND is_active",
        )
        .bind(staff_id)
        .bind(salon_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Staff {} not found", staff_id)))
    }

    /// Transaction-scoped variant of [`get_service`](Self::get_service),
    /// used by the booking writer so the snapshot is taken under the same
    /// isolation as the insert.
    pub async fn get_service_tx(
        &self,
        conn: &mut PgConnection,
        salon_id: Uuid,
        service_id: Uuid,
    ) -> AppResult<Service> {
        sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE id = $1 AND salon_id = $2 AND is_active",
        )
        .bind(service_id)
        .bind(salon_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Service {} not found", service_id)))
    }

    /// Transaction-scoped staff lookup
    pub async fn get_staff_tx(
        &self,
        conn: &mut PgConnection,
        salon_id: Uuid,
        staff_id: Uuid,
    ) -> AppResult<Staff> {
        sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE id = $1 AND salon_id = $2 AND is_active",
        )
        .bind(staff_id)
        .bind(salon_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Staff {} not found", staff_id)))
    }

    /// Whether the staff member performs the given service
    pub async fn staff_performs_service(
        &self,
        conn: &mut PgConnection,
        staff_id: Uuid,
        service_id: Uuid,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM staff_services WHERE staff_id = $1 AND service_id = $2)",
        )
        .bind(staff_id)
        .bind(service_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }
}
