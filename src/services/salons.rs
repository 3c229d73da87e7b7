//! Salon tenant resolution and shift configuration

use chrono::NaiveTime;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        salon::Salon,
        shift::{CreateShift, Shift},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct SalonsService {
    repository: Repository,
}

impl SalonsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Database connectivity probe for readiness checks
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.repository.pool)
            .await?;
        Ok(())
    }

    /// Resolve an active tenant by slug
    pub async fn resolve(&self, slug: &str) -> AppResult<Salon> {
        self.repository.salons.get_by_slug(slug).await
    }

    /// List a staff member's active shifts
    pub async fn list_shifts(&self, salon: &Salon, staff_id: Uuid) -> AppResult<Vec<Shift>> {
        let staff = self.repository.salons.get_staff(salon.id, staff_id).await?;
        self.repository.shifts.list_active(salon.id, staff.id).await
    }

    /// Create a recurring weekly shift for a staff member
    pub async fn create_shift(
        &self,
        salon: &Salon,
        staff_id: Uuid,
        data: CreateShift,
    ) -> AppResult<Shift> {
        let staff = self.repository.salons.get_staff(salon.id, staff_id).await?;
        let start = NaiveTime::parse_from_str(&data.start_time, "%H:%M")
            .map_err(|_| AppError::Validation("Invalid start_time (use HH:MM)".to_string()))?;
        let end = NaiveTime::parse_from_str(&data.end_time, "%H:%M")
            .map_err(|_| AppError::Validation("Invalid end_time (use HH:MM)".to_string()))?;
        if start >= end {
            return Err(AppError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }
        self.repository
            .shifts
            .create(salon.id, staff.id, data.day_of_week, start, end)
            .await
    }

    /// Deactivate a shift
    pub async fn remove_shift(&self, salon: &Salon, shift_id: Uuid) -> AppResult<()> {
        self.repository.shifts.deactivate(salon.id, shift_id).await
    }
}
