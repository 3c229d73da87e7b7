//! Domain models for Bookline entities

pub mod booking;
pub mod catalog;
pub mod commission;
pub mod customer;
pub mod enums;
pub mod idempotency;
pub mod payment;
pub mod salon;
pub mod shift;
