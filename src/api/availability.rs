//! Availability endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppResult;

/// Query parameters for the availability calculator
#[derive(Debug, Deserialize, IntoParams)]
pub struct AvailabilityQuery {
    pub service_id: Uuid,
    pub staff_id: Uuid,
    /// First date of the range (inclusive, salon-local)
    pub from: NaiveDate,
    /// Last date of the range (inclusive, salon-local)
    pub to: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub service_id: Uuid,
    pub staff_id: Uuid,
    /// Bookable slot start instants, ascending (RFC 3339)
    pub slots: Vec<DateTime<Utc>>,
}

/// Bookable slots for a service/staff pair over a date range
#[utoipa::path(
    get,
    path = "/salons/{slug}/availability",
    tag = "availability",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Bookable slot start instants", body = AvailabilityResponse),
        (status = 400, description = "Invalid date range"),
        (status = 404, description = "Salon, service or staff not found")
    )
)]
pub async fn get_availability(
    State(state): State<crate::AppState>,
    Path(slug): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<AvailabilityResponse>> {
    let salon = state.services.salons.resolve(&slug).await?;
    let slots = state
        .services
        .availability
        .get_slots(&salon, query.service_id, query.staff_id, query.from, query.to)
        .await?;
    Ok(Json(AvailabilityResponse {
        service_id: query.service_id,
        staff_id: query.staff_id,
        slots,
    }))
}
