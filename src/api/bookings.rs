//! Booking endpoints
//!
//! Every mutating endpoint requires an Idempotency-Key header and runs
//! under the idempotency coordinator: the cached (status, body) pair is
//! replayed verbatim for a repeated key with an identical payload.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{Booking, CreateBookingRequest, ListBookingsQuery, UpdateBookingRequest},
        enums::TransitionAction,
    },
};

use super::IdempotencyKey;

fn to_body<T: serde::Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

/// Create a booking
#[utoipa::path(
    post,
    path = "/salons/{slug}/bookings",
    tag = "bookings",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("Idempotency-Key" = String, Header, description = "Client idempotency key")
    ),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Salon, service or staff not found"),
        (status = 409, description = "Slot unavailable or idempotency conflict")
    )
)]
pub async fn create_booking(
    State(state): State<crate::AppState>,
    Path(slug): Path<String>,
    IdempotencyKey(key): IdempotencyKey,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let request: CreateBookingRequest = serde_json::from_value(payload.clone())
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let salon = state.services.salons.resolve(&slug).await?;
    let salon_id = salon.id;
    let path = format!("/salons/{}/bookings", slug);
    let services = state.services.clone();
    let (status, body) = state
        .services
        .idempotency
        .run(salon_id, "POST", &path, &key, &payload, move || async move {
            let booking = services.bookings.create(&salon, request).await?;
            Ok((StatusCode::CREATED, to_body(&booking)?))
        })
        .await?;
    Ok((status, Json(body)))
}

/// Reschedule a booking (service, staff and/or time)
#[utoipa::path(
    patch,
    path = "/salons/{slug}/bookings/{id}",
    tag = "bookings",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Booking ID"),
        ("Idempotency-Key" = String, Header, description = "Client idempotency key")
    ),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Booking rescheduled", body = Booking),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Slot unavailable or terminal booking")
    )
)]
pub async fn update_booking(
    State(state): State<crate::AppState>,
    Path((slug, booking_id)): Path<(String, Uuid)>,
    IdempotencyKey(key): IdempotencyKey,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let request: UpdateBookingRequest = serde_json::from_value(payload.clone())
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?;

    let salon = state.services.salons.resolve(&slug).await?;
    let salon_id = salon.id;
    let path = format!("/salons/{}/bookings/{}", slug, booking_id);
    let services = state.services.clone();
    let (status, body) = state
        .services
        .idempotency
        .run(salon_id, "PATCH", &path, &key, &payload, move || async move {
            let booking = services.bookings.reschedule(&salon, booking_id, request).await?;
            Ok((StatusCode::OK, to_body(&booking)?))
        })
        .await?;
    Ok((status, Json(body)))
}

/// Get a booking
#[utoipa::path(
    get,
    path = "/salons/{slug}/bookings/{id}",
    tag = "bookings",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking", body = Booking),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<crate::AppState>,
    Path((slug, booking_id)): Path<(String, Uuid)>,
) -> AppResult<Json<Booking>> {
    let salon = state.services.salons.resolve(&slug).await?;
    let booking = state.services.bookings.get(&salon, booking_id).await?;
    Ok(Json(booking))
}

/// List bookings
#[utoipa::path(
    get,
    path = "/salons/{slug}/bookings",
    tag = "bookings",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ListBookingsQuery
    ),
    responses(
        (status = 200, description = "Bookings ordered by start time", body = Vec<Booking>),
        (status = 404, description = "Salon not found")
    )
)]
pub async fn list_bookings(
    State(state): State<crate::AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListBookingsQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let salon = state.services.salons.resolve(&slug).await?;
    let bookings = state.services.bookings.list(&salon, query).await?;
    Ok(Json(bookings))
}

async fn run_transition(
    state: crate::AppState,
    slug: String,
    booking_id: Uuid,
    key: String,
    action: TransitionAction,
    segment: &str,
) -> AppResult<(StatusCode, Json<Value>)> {
    let salon = state.services.salons.resolve(&slug).await?;
    let salon_id = salon.id;
    let path = format!("/salons/{}/bookings/{}/{}", slug, booking_id, segment);
    let services = state.services.clone();
    let (status, body) = state
        .services
        .idempotency
        .run(salon_id, "POST", &path, &key, &Value::Null, move || async move {
            let booking = services.bookings.transition(&salon, booking_id, action).await?;
            Ok((StatusCode::OK, to_body(&booking)?))
        })
        .await?;
    Ok((status, Json(body)))
}

/// Confirm a pending booking
#[utoipa::path(
    post,
    path = "/salons/{slug}/bookings/{id}/confirm",
    tag = "bookings",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Booking ID"),
        ("Idempotency-Key" = String, Header, description = "Client idempotency key")
    ),
    responses(
        (status = 200, description = "Booking confirmed", body = Booking),
        (status = 409, description = "Invalid transition")
    )
)]
pub async fn confirm_booking(
    State(state): State<crate::AppState>,
    Path((slug, booking_id)): Path<(String, Uuid)>,
    IdempotencyKey(key): IdempotencyKey,
) -> AppResult<(StatusCode, Json<Value>)> {
    run_transition(state, slug, booking_id, key, TransitionAction::Confirm, "confirm").await
}

/// Cancel a booking
#[utoipa::path(
    post,
    path = "/salons/{slug}/bookings/{id}/cancel",
    tag = "bookings",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Booking ID"),
        ("Idempotency-Key" = String, Header, description = "Client idempotency key")
    ),
    responses(
        (status = 200, description = "Booking canceled", body = Booking),
        (status = 409, description = "Invalid transition")
    )
)]
pub async fn cancel_booking(
    State(state): State<crate::AppState>,
    Path((slug, booking_id)): Path<(String, Uuid)>,
    IdempotencyKey(key): IdempotencyKey,
) -> AppResult<(StatusCode, Json<Value>)> {
    run_transition(state, slug, booking_id, key, TransitionAction::Cancel, "cancel").await
}

/// Mark a booking as done
#[utoipa::path(
    post,
    path = "/salons/{slug}/bookings/{id}/complete",
    tag = "bookings",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Booking ID"),
        ("Idempotency-Key" = String, Header, description = "Client idempotency key")
    ),
    responses(
        (status = 200, description = "Booking completed", body = Booking),
        (status = 409, description = "Invalid transition")
    )
)]
pub async fn complete_booking(
    State(state): State<crate::AppState>,
    Path((slug, booking_id)): Path<(String, Uuid)>,
    IdempotencyKey(key): IdempotencyKey,
) -> AppResult<(StatusCode, Json<Value>)> {
    run_transition(state, slug, booking_id, key, TransitionAction::Complete, "complete").await
}

/// Mark a booking as a no-show
#[utoipa::path(
    post,
    path = "/salons/{slug}/bookings/{id}/no-show",
    tag = "bookings",
    params(
        ("slug" = String, Path, description = "Salon slug"),
        ("id" = Uuid, Path, description = "Booking ID"),
        ("Idempotency-Key" = String, Header, description = "Client idempotency key")
    ),
    responses(
        (status = 200, description = "Booking marked no-show", body = Booking),
        (status = 409, description = "Invalid transition")
    )
)]
pub async fn no_show_booking(
    State(state): State<crate::AppState>,
    Path((slug, booking_id)): Path<(String, Uuid)>,
    IdempotencyKey(key): IdempotencyKey,
) -> AppResult<(StatusCode, Json<Value>)> {
    run_transition(state, slug, booking_id, key, TransitionAction::NoShow, "no-show").await
}
