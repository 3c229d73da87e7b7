//! Payment endpoints
//!
//! Checkout initiation runs under the client idempotency coordinator.
//! Provider webhooks carry their own idempotency: each (provider,
//! event_id) pair is applied at most once and replays are acknowledged
//! with 200 without touching the ledger.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::payment::{Payment, PaymentWebhookRequest},
};

use super::IdempotencyKey;

#[derive(Serialize, ToSchema)]
pub struct WebhookResponse {
    pub status: String,
}

/// Initiate a checkout for the booking's outstanding balance
#[utoipa::path(
    post,
    path = "/salons/{slug}/bookings/{id}/payments",
    tag = "payments",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Booking ID"),
        ("Idempotency-Key" = String, Header, description = "Client idempotency key")
    ),
    responses(
        (status = 201, description = "Checkout initiated", body = InitPaymentResponse),
        (status = 400, description = "No outstanding balance"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking not payable in its current status")
    )
)]
pub async fn init_payment(
    State(state): State<crate::AppState>,
    Path((slug, booking_id)): Path<(String, Uuid)>,
    IdempotencyKey(key): IdempotencyKey,
) -> AppResult<(StatusCode, Json<Value>)> {
    let salon = state.services.salons.resolve(&slug).await?;
    let salon_id = salon.id;
    let path = format!("/salons/{}/bookings/{}/payments", slug, booking_id);
    let services = state.services.clone();
    let (status, body) = state
        .services
        .idempotency
        .run(salon_id, "POST", &path, &key, &Value::Null, move || async move {
            let response = services.payments.init_payment(&salon, booking_id).await?;
            let body = serde_json::to_value(&response)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok((StatusCode::CREATED, body))
        })
        .await?;
    Ok((status, Json(body)))
}

/// List a booking's payments
#[utoipa::path(
    get,
    path = "/salons/{slug}/bookings/{id}/payments",
    tag = "payments",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Payments for the booking", body = Vec<Payment>),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn list_payments(
    State(state): State<crate::AppState>,
    Path((slug, booking_id)): Path<(String, Uuid)>,
) -> AppResult<Json<Vec<Payment>>> {
    let salon = state.services.salons.resolve(&slug).await?;
    let payments = state.services.payments.list_for_booking(&salon, booking_id).await?;
    Ok(Json(payments))
}

/// Payment provider webhook
#[utoipa::path(
    post,
    path = "/webhooks/payments/{provider}",
    tag = "payments",
    params(
        ("provider" = String, Path, description = "Payment provider name")
    ),
    request_body = PaymentWebhookRequest,
    responses(
        (status = 200, description = "Event applied or replay acknowledged", body = WebhookResponse),
        (status = 404, description = "Payment not found"),
        (status = 409, description = "Invalid payment transition")
    )
)]
pub async fn payment_webhook(
    State(state): State<crate::AppState>,
    Path(provider): Path<String>,
    Json(request): Json<PaymentWebhookRequest>,
) -> AppResult<Json<WebhookResponse>> {
    let applied = state
        .services
        .payments
        .process_webhook(&provider, request)
        .await?;
    let status = if applied.is_some() { "applied" } else { "replayed" };
    Ok(Json(WebhookResponse {
        status: status.to_string(),
    }))
}
