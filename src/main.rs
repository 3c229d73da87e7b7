//! Bookline Server - Multi-tenant Salon Appointment Booking

use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookline_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bookline_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bookline Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, &config);

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    spawn_idempotency_sweeper(state.services.clone());

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically delete expired idempotency records
fn spawn_idempotency_sweeper(services: Arc<Services>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match services.idempotency.sweep_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!(swept = n, "Expired idempotency records deleted"),
                Err(e) => tracing::error!("Idempotency sweep failed: {}", e),
            }
        }
    });
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Availability
        .route(
            "/salons/:slug/availability",
            get(api::availability::get_availability),
        )
        // Bookings
        .route(
            "/salons/:slug/bookings",
            get(api::bookings::list_bookings).post(api::bookings::create_booking),
        )
        .route(
            "/salons/:slug/bookings/:id",
            get(api::bookings::get_booking).patch(api::bookings::update_booking),
        )
        .route(
            "/salons/:slug/bookings/:id/confirm",
            post(api::bookings::confirm_booking),
        )
        .route(
            "/salons/:slug/bookings/:id/cancel",
            post(api::bookings::cancel_booking),
        )
        .route(
            "/salons/:slug/bookings/:id/complete",
            post(api::bookings::complete_booking),
        )
        .route(
            "/salons/:slug/bookings/:id/no-show",
            post(api::bookings::no_show_booking),
        )
        // Payments
        .route(
            "/salons/:slug/bookings/:id/payments",
            get(api::payments::list_payments).post(api::payments::init_payment),
        )
        .route(
            "/webhooks/payments/:provider",
            post(api::payments::payment_webhook),
        )
        // Commissions
        .route(
            "/salons/:slug/bookings/:id/commission",
            get(api::commissions::get_commission),
        )
        .route(
            "/salons/:slug/commissions/:id/transition",
            post(api::commissions::transition_commission),
        )
        // Shifts
        .route(
            "/salons/:slug/staff/:staff_id/shifts",
            get(api::shifts::list_shifts).post(api::shifts::create_shift),
        )
        .route(
            "/salons/:slug/shifts/:id",
            delete(api::shifts::delete_shift),
        )
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
