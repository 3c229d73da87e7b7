//! Bookline - Multi-tenant Salon Appointment Booking Server
//!
//! REST JSON API for salon availability, overlap-safe booking writes,
//! payments and platform commissions, with idempotent mutations.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
