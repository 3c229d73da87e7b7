//! Shift configuration endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::shift::{CreateShift, Shift},
};

/// List a staff member's active shifts
#[utoipa::path(
    get,
    path = "/salons/{slug}/staff/{staff_id}/shifts",
    tag = "shifts",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("staff_id" = Uuid, Path, description = "Staff ID")
    ),
    responses(
        (status = 200, description = "Active shifts", body = Vec<Shift>),
        (status = 404, description = "Salon or staff not found")
    )
)]
pub async fn list_shifts(
    State(state): State<crate::AppState>,
    Path((slug, staff_id)): Path<(String, Uuid)>,
) -> AppResult<Json<Vec<Shift>>> {
    let salon = state.services.salons.resolve(&slug).await?;
    let shifts = state.services.salons.list_shifts(&salon, staff_id).await?;
    Ok(Json(shifts))
}

/// Create a recurring weekly shift
#[utoipa::path(
    post,
    path = "/salons/{slug}/staff/{staff_id}/shifts",
    tag = "shifts",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("staff_id" = Uuid, Path, description = "Staff ID")
    ),
    request_body = CreateShift,
    responses(
        (status = 201, description = "Shift created", body = Shift),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Salon or staff not found")
    )
)]
pub async fn create_shift(
    State(state): State<crate::AppState>,
    Path((slug, staff_id)): Path<(String, Uuid)>,
    Json(request): Json<CreateShift>,
) -> AppResult<(StatusCode, Json<Shift>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let salon = state.services.salons.resolve(&slug).await?;
    let shift = state
        .services
        .salons
        .create_shift(&salon, staff_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

/// Deactivate a shift
#[utoipa::path(
    delete,
    path = "/salons/{slug}/shifts/{id}",
    tag = "shifts",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Shift ID")
    ),
    responses(
        (status = 204, description = "Shift deactivated"),
        (status = 404, description = "Shift not found")
    )
)]
pub async fn delete_shift(
    State(state): State<crate::AppState>,
    Path((slug, shift_id)): Path<(String, Uuid)>,
) -> AppResult<StatusCode> {
    let salon = state.services.salons.resolve(&slug).await?;
    state.services.salons.remove_shift(&salon, shift_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
