//! Analytics resync side effect
//!
//! The aggregation backend is external; the core only calls its resync
//! hook. The call is idempotent on the backend side, so replaying it for
//! the same (salon, staff, service, date) is always safe.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use crate::{
    config::AnalyticsConfig,
    error::{AppError, AppResult},
    services::dispatcher::{BookingEvent, EventHandler},
};

#[async_trait]
pub trait AnalyticsResync: Send + Sync {
    async fn resync(
        &self,
        salon_id: Uuid,
        staff_id: Option<Uuid>,
        service_id: Option<Uuid>,
        date: NaiveDate,
    ) -> AppResult<()>;
}

/// HTTP client for the analytics backend's resync hook
pub struct HttpAnalyticsClient {
    config: AnalyticsConfig,
    client: reqwest::Client,
}

impl HttpAnalyticsClient {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AnalyticsResync for HttpAnalyticsClient {
    async fn resync(
        &self,
        salon_id: Uuid,
        staff_id: Option<Uuid>,
        service_id: Option<Uuid>,
        date: NaiveDate,
    ) -> AppResult<()> {
        let url = format!("{}/resync", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "salon_id": salon_id,
                "staff_id": staff_id,
                "service_id": service_id,
                "date": date,
            }))
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Analytics resync request: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Analytics resync returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Client used when the analytics backend is not configured
pub struct NoopAnalyticsClient;

#[async_trait]
impl AnalyticsResync for NoopAnalyticsClient {
    async fn resync(
        &self,
        salon_id: Uuid,
        _staff_id: Option<Uuid>,
        _service_id: Option<Uuid>,
        _date: NaiveDate,
    ) -> AppResult<()> {
        tracing::debug!(%salon_id, "Analytics resync suppressed");
        Ok(())
    }
}

/// Dispatcher handler resyncing the affected (salon, staff, service, day)
pub struct AnalyticsHandler {
    client: std::sync::Arc<dyn AnalyticsResync>,
}

impl AnalyticsHandler {
    pub fn new(client: std::sync::Arc<dyn AnalyticsResync>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventHandler for AnalyticsHandler {
    fn name(&self) -> &'static str {
        "analytics"
    }

    async fn handle(&self, event: &BookingEvent) -> AppResult<()> {
        let booking = event.booking();
        self.client
            .resync(
                booking.salon_id,
                Some(booking.staff_id),
                Some(booking.service_id),
                booking.start_at.date_naive(),
            )
            .await
    }
}
