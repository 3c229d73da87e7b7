//! Repository layer for database operations
//!
//! Each sub-repository owns read paths against the shared pool. Methods that
//! take part in a booking or payment transaction accept an explicit
//! `&mut PgConnection` unit of work instead of falling back to the pool, so
//! a nested call can never silently escape the enclosing transaction.

pub mod bookings;
pub mod commissions;
pub mod customers;
pub mod idempotency;
pub mod payments;
pub mod salons;
pub mod shifts;

use sqlx::{Pool, Postgres};

/// Main repository struct holding the database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub salons: salons::SalonsRepository,
    pub shifts: shifts::ShiftsRepository,
    pub customers: customers::CustomersRepository,
    pub bookings: bookings::BookingsRepository,
    pub payments: payments::PaymentsRepository,
    pub commissions: commissions::CommissionsRepository,
    pub idempotency: idempotency::IdempotencyRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            salons: salons::SalonsRepository::new(pool.clone()),
            shifts: shifts::ShiftsRepository::new(pool.clone()),
            customers: customers::CustomersRepository::new(pool.clone()),
            bookings: bookings::BookingsRepository::new(pool.clone()),
            payments: payments::PaymentsRepository::new(pool.clone()),
            commissions: commissions::CommissionsRepository::new(pool.clone()),
            idempotency: idempotency::IdempotencyRepository::new(pool.clone()),
            pool,
        }
    }
}
