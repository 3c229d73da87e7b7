//! Booking transaction writer and lifecycle transitions
//!
//! All writes to the booking aggregate run in a single transaction at
//! REPEATABLE READ with a bounded statement timeout. Of N concurrent
//! conflicting requests for the same staff/window exactly one commits; the
//! rest get SLOT_UNAVAILABLE, either from the in-transaction pre-check or
//! from the exclusion constraint translation in the repository. Side
//! effects are dispatched strictly after commit.

use chrono::Duration;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{Booking, CreateBookingRequest, ListBookingsQuery, UpdateBookingRequest},
        enums::{BookingSource, BookingStatus, TransitionAction},
        salon::Salon,
    },
    repository::{bookings::NewBooking, bookings::SLOT_TAKEN, Repository},
    services::{
        availability::{parse_timezone, window_within_shifts},
        customers::CustomersService,
        dispatcher::{BookingEvent, Dispatcher},
    },
};

const OUTSIDE_SHIFT: &str = "Requested time is outside staff working hours";

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    customers: CustomersService,
    dispatcher: Dispatcher,
    statement_timeout_ms: u64,
}

impl BookingsService {
    pub fn new(
        repository: Repository,
        customers: CustomersService,
        dispatcher: Dispatcher,
        statement_timeout_ms: u64,
    ) -> Self {
        Self {
            repository,
            customers,
            dispatcher,
            statement_timeout_ms,
        }
    }

    /// Open the write transaction for the booking aggregate. REPEATABLE
    /// READ closes the write-skew window between the overlap pre-check and
    /// the insert; the exclusion constraint remains the authority.
    async fn begin_write_tx(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.repository.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(tx.as_mut())
            .await?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout_ms
        ))
        .execute(tx.as_mut())
        .await?;
        Ok(tx)
    }

    fn initial_status(salon: &Salon, source: BookingSource) -> BookingStatus {
        match source {
            BookingSource::InPerson => BookingStatus::Confirmed,
            BookingSource::Online if salon.auto_confirm => BookingStatus::Confirmed,
            BookingSource::Online => BookingStatus::Pending,
        }
    }

    /// Create a booking for the requested slot
    pub async fn create(&self, salon: &Salon, req: CreateBookingRequest) -> AppResult<Booking> {
        let source = req.source.unwrap_or(BookingSource::Online);
        if source == BookingSource::Online && !salon.allow_online_booking {
            return Err(AppError::Validation(
                "Salon does not accept online bookings".to_string(),
            ));
        }
        let tz = parse_timezone(&salon.timezone)?;

        // Customer directory is its own aggregate; resolve it before the
        // booking transaction opens.
        let customer = self
            .customers
            .find_or_create(salon, &req.customer_phone, &req.customer_name)
            .await?;

        let mut tx = self.begin_write_tx().await?;

        let service = self
            .repository
            .salons
            .get_service_tx(tx.as_mut(), salon.id, req.service_id)
            .await?;
        let staff = self
            .repository
            .salons
            .get_staff_tx(tx.as_mut(), salon.id, req.staff_id)
            .await?;
        if !self
            .repository
            .salons
            .staff_performs_service(tx.as_mut(), staff.id, service.id)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Staff {} does not perform service {}",
                staff.id, service.id
            )));
        }

        let start_at = req.start_at;
        let end_at = start_at + Duration::minutes(service.duration_minutes as i64);

        let shifts = self
            .repository
            .shifts
            .list_active_tx(tx.as_mut(), salon.id, staff.id)
            .await?;
        if !window_within_shifts(&shifts, tz, start_at, end_at) {
            return Err(AppError::SlotUnavailable(OUTSIDE_SHIFT.to_string()));
        }

        if self
            .repository
            .bookings
            .overlap_exists(tx.as_mut(), staff.id, start_at, end_at, None)
            .await?
        {
            return Err(AppError::SlotUnavailable(SLOT_TAKEN.to_string()));
        }

        let booking = self
            .repository
            .bookings
            .insert(
                tx.as_mut(),
                NewBooking {
                    salon_id: salon.id,
                    staff_id: staff.id,
                    service_id: service.id,
                    customer_id: customer.id,
                    start_at,
                    end_at,
                    status: Self::initial_status(salon, source),
                    source,
                    service_name: service.name.clone(),
                    duration_minutes: service.duration_minutes,
                    price: service.price,
                    currency: service.currency.clone(),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            staff_id = %booking.staff_id,
            start_at = %booking.start_at,
            "Booking created"
        );
        self.dispatcher.dispatch(BookingEvent::Created {
            booking: booking.clone(),
        });
        Ok(booking)
    }

    /// Reschedule a booking: change its service, staff and/or time. The
    /// non-overlap invariant is re-validated for the new window.
    pub async fn reschedule(
        &self,
        salon: &Salon,
        booking_id: Uuid,
        req: UpdateBookingRequest,
    ) -> AppResult<Booking> {
        let tz = parse_timezone(&salon.timezone)?;
        let mut tx = self.begin_write_tx().await?;

        let current = self
            .repository
            .bookings
            .get_for_update(tx.as_mut(), salon.id, booking_id)
            .await?;
        if current.status.is_terminal() {
            return Err(AppError::InvalidTransition(format!(
                "Cannot reschedule a booking in terminal status {}",
                current.status
            )));
        }

        let service_id = req.service_id.unwrap_or(current.service_id);
        let staff_id = req.staff_id.unwrap_or(current.staff_id);
        let start_at = req.start_at.unwrap_or(current.start_at);

        // Fresh snapshots only when the service itself changes; otherwise
        // the creation-time snapshot stays untouched.
        let (service_name, duration_minutes, price, currency) = if service_id != current.service_id
        {
            let service = self
                .repository
                .salons
                .get_service_tx(tx.as_mut(), salon.id, service_id)
                .await?;
            (
                service.name,
                service.duration_minutes,
                service.price,
                service.currency,
            )
        } else {
            (
                current.service_name.clone(),
                current.duration_minutes,
                current.price,
                current.currency.clone(),
            )
        };

        let staff = self
            .repository
            .salons
            .get_staff_tx(tx.as_mut(), salon.id, staff_id)
            .await?;
        if !self
            .repository
            .salons
            .staff_performs_service(tx.as_mut(), staff.id, service_id)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Staff {} does not perform service {}",
                staff.id, service_id
            )));
        }

        let end_at = start_at + Duration::minutes(duration_minutes as i64);

        let shifts = self
            .repository
            .shifts
            .list_active_tx(tx.as_mut(), salon.id, staff.id)
            .await?;
        if !window_within_shifts(&shifts, tz, start_at, end_at) {
            return Err(AppError::SlotUnavailable(OUTSIDE_SHIFT.to_string()));
        }

        if self
            .repository
            .bookings
            .overlap_exists(tx.as_mut(), staff.id, start_at, end_at, Some(current.id))
            .await?
        {
            return Err(AppError::SlotUnavailable(SLOT_TAKEN.to_string()));
        }

        let booking = self
            .repository
            .bookings
            .reschedule(
                tx.as_mut(),
                current.id,
                staff.id,
                service_id,
                start_at,
                end_at,
                &service_name,
                duration_minutes,
                price,
                &currency,
            )
            .await?;

        tx.commit().await?;

        self.dispatcher.dispatch(BookingEvent::Rescheduled {
            booking: booking.clone(),
        });
        Ok(booking)
    }

    /// Apply a lifecycle action (confirm, cancel, complete, no-show)
    pub async fn transition(
        &self,
        salon: &Salon,
        booking_id: Uuid,
        action: TransitionAction,
    ) -> AppResult<Booking> {
        let mut tx = self.repository.pool.begin().await?;

        let current = self
            .repository
            .bookings
            .get_for_update(tx.as_mut(), salon.id, booking_id)
            .await?;

        let Some(target) = current.status.transition(action) else {
            let reason = if current.status.is_terminal() {
                format!("booking is already in terminal status {}", current.status)
            } else {
                format!("{:?} is not allowed from status {}", action, current.status)
            };
            return Err(AppError::InvalidTransition(reason));
        };

        let booking = self
            .repository
            .bookings
            .set_status(tx.as_mut(), current.id, target)
            .await?;
        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            from = %current.status,
            to = %booking.status,
            "Booking transitioned"
        );
        self.dispatcher.dispatch(BookingEvent::StatusChanged {
            booking: booking.clone(),
            previous: current.status,
            action,
        });
        Ok(booking)
    }

    /// Get a booking
    pub async fn get(&self, salon: &Salon, booking_id: Uuid) -> AppResult<Booking> {
        self.repository.bookings.get_by_id(salon.id, booking_id).await
    }

    /// List bookings
    pub async fn list(&self, salon: &Salon, query: ListBookingsQuery) -> AppResult<Vec<Booking>> {
        self.repository.bookings.list(salon.id, &query).await
    }
}
