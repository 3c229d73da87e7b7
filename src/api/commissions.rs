//! Platform commission endpoints (operator surface)

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::commission::{BookingCommission, CommissionPayment, TransitionCommissionRequest},
};

#[derive(Serialize, ToSchema)]
pub struct CommissionResponse {
    pub commission: BookingCommission,
    pub payments: Vec<CommissionPayment>,
}

/// Get the commission accrued for a booking
#[utoipa::path(
    get,
    path = "/salons/{slug}/bookings/{id}/commission",
    tag = "commissions",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Commission with its payments", body = CommissionResponse),
        (status = 404, description = "No commission for this booking")
    )
)]
pub async fn get_commission(
    State(state): State<crate::AppState>,
    Path((slug, booking_id)): Path<(String, Uuid)>,
) -> AppResult<Json<CommissionResponse>> {
    let salon = state.services.salons.resolve(&slug).await?;
    let (commission, payments) = state
        .services
        .commissions
        .get_for_booking(salon.id, booking_id)
        .await?;
    Ok(Json(CommissionResponse {
        commission,
        payments,
    }))
}

/// Transition a commission (accrue, charge or waive)
#[utoipa::path(
    post,
    path = "/salons/{slug}/commissions/{id}/transition",
    tag = "commissions",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Commission ID")
    ),
    request_body = TransitionCommissionRequest,
    responses(
        (status = 200, description = "Commission transitioned", body = BookingCommission),
        (status = 404, description = "Commission not found"),
        (status = 409, description = "Invalid commission transition")
    )
)]
pub async fn transition_commission(
    State(state): State<crate::AppState>,
    Path((slug, commission_id)): Path<(String, Uuid)>,
    Json(request): Json<TransitionCommissionRequest>,
) -> AppResult<Json<BookingCommission>> {
    let salon = state.services.salons.resolve(&slug).await?;
    let commission = state
        .services
        .commissions
        .transition(salon.id, commission_id, request.action)
        .await?;
    Ok(Json(commission))
}
