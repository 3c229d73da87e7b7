//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{availability, bookings, commissions, health, payments, shifts};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookline API",
        version = "0.3.0",
        description = "Multi-tenant salon appointment booking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Availability
        availability::get_availability,
        // Bookings
        bookings::create_booking,
        bookings::update_booking,
        bookings::get_booking,
        bookings::list_bookings,
        bookings::confirm_booking,
        bookings::cancel_booking,
        bookings::complete_booking,
        bookings::no_show_booking,
        // Payments
        payments::init_payment,
        payments::list_payments,
        payments::payment_webhook,
        // Commissions
        commissions::get_commission,
        commissions::transition_commission,
        // Shifts
        shifts::list_shifts,
        shifts::create_shift,
        shifts::delete_shift,
    ),
    components(
        schemas(
            // Availability
            availability::AvailabilityResponse,
            // Bookings
            crate::models::booking::Booking,
            crate::models::booking::CreateBookingRequest,
            crate::models::booking::UpdateBookingRequest,
            crate::models::enums::BookingStatus,
            crate::models::enums::BookingSource,
            crate::models::enums::PaymentState,
            // Payments
            crate::models::payment::Payment,
            crate::models::payment::InitPaymentResponse,
            crate::models::payment::PaymentWebhookRequest,
            crate::models::payment::WebhookOutcome,
            crate::models::enums::PaymentStatus,
            payments::WebhookResponse,
            // Commissions
            crate::models::commission::BookingCommission,
            crate::models::commission::CommissionPayment,
            crate::models::commission::CommissionAction,
            crate::models::commission::TransitionCommissionRequest,
            crate::models::enums::CommissionStatus,
            crate::models::enums::CommissionKind,
            commissions::CommissionResponse,
            // Shifts
            crate::models::shift::Shift,
            crate::models::shift::CreateShift,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "availability", description = "Bookable slot calculation"),
        (name = "bookings", description = "Booking lifecycle"),
        (name = "payments", description = "Payment ledger and provider webhooks"),
        (name = "commissions", description = "Platform commissions"),
        (name = "shifts", description = "Staff shift configuration")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
