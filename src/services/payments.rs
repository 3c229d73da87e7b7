//! Payment ledger service
//!
//! Payments move through their own state machine; the booking's aggregate
//! payment state is recomputed from the full ledger inside the same
//! transaction that mutates it, never incrementally patched.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{derive_payment_state, PaymentStatus},
        payment::{InitPaymentResponse, Payment, PaymentWebhookRequest},
        salon::Salon,
    },
    repository::Repository,
    services::dispatcher::{BookingEvent, Dispatcher},
};

/// Provider name attached to checkout payments initiated through the API
const CHECKOUT_PROVIDER: &str = "checkout";

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
    dispatcher: Dispatcher,
}

impl PaymentsService {
    pub fn new(repository: Repository, dispatcher: Dispatcher) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Initiate a provider checkout for the booking's outstanding balance
    pub async fn init_payment(
        &self,
        salon: &Salon,
        booking_id: Uuid,
    ) -> AppResult<InitPaymentResponse> {
        let booking = self.repository.bookings.get_by_id(salon.id, booking_id).await?;
        if !booking.status.holds_calendar() {
            return Err(AppError::InvalidTransition(format!(
                "Cannot take payment for a booking in status {}",
                booking.status
            )));
        }

        let mut tx = self.repository.pool.begin().await?;
        let ledger = self.repository.payments.ledger(tx.as_mut(), booking.id).await?;
        let paid: i64 = ledger
            .iter()
            .filter(|(s, _)| *s == PaymentStatus::Paid)
            .map(|(_, a)| a)
            .sum();
        let refunded: i64 = ledger
            .iter()
            .filter(|(s, _)| *s == PaymentStatus::Refunded)
            .map(|(_, a)| a)
            .sum();
        let outstanding = booking.price - (paid - refunded);
        if outstanding <= 0 {
            return Err(AppError::Validation(
                "Booking has no outstanding balance".to_string(),
            ));
        }

        let checkout_reference = Uuid::new_v4().to_string();
        let payment = self
            .repository
            .payments
            .insert_initiated(
                tx.as_mut(),
                salon.id,
                booking.id,
                outstanding,
                &booking.currency,
                CHECKOUT_PROVIDER,
                &checkout_reference,
                None,
            )
            .await?;
        tx.commit().await?;

        Ok(InitPaymentResponse {
            payment_id: payment.id,
            checkout_reference,
            amount: payment.amount,
            currency: payment.currency,
        })
    }

    /// Apply a provider webhook. Idempotent per (provider, event_id): a
    /// replayed event is acknowledged without touching the ledger.
    ///
    /// Returns the payment when the event had an effect.
    pub async fn process_webhook(
        &self,
        provider: &str,
        req: PaymentWebhookRequest,
    ) -> AppResult<Option<Payment>> {
        let mut tx = self.repository.pool.begin().await?;

        let fresh = self
            .repository
            .payments
            .record_event_once(tx.as_mut(), provider, &req.event_id, req.payment_id)
            .await?;
        if !fresh {
            tx.commit().await?;
            tracing::debug!(provider, event_id = %req.event_id, "Webhook replay acknowledged");
            return Ok(None);
        }

        let payment = self
            .repository
            .payments
            .get_for_update(tx.as_mut(), req.payment_id)
            .await?;
        let target = req.outcome.target_status();
        if !payment.status.can_transition(target) {
            return Err(AppError::InvalidTransition(format!(
                "Payment cannot move from {:?} to {:?}",
                payment.status, target
            )));
        }

        let payment = self
            .repository
            .payments
            .set_status(tx.as_mut(), payment.id, target, req.provider_ref.as_deref())
            .await?;

        // Lock the booking, then recompute its aggregate payment state
        // from the whole ledger.
        let booking = self
            .repository
            .bookings
            .get_for_update(tx.as_mut(), payment.salon_id, payment.booking_id)
            .await?;
        let ledger = self.repository.payments.ledger(tx.as_mut(), booking.id).await?;
        let state = derive_payment_state(booking.price, &ledger);
        self.repository
            .bookings
            .set_payment_state(tx.as_mut(), booking.id, state)
            .await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            booking_id = %booking.id,
            status = ?payment.status,
            payment_state = ?state,
            "Payment recorded"
        );
        let mut booking = booking;
        booking.payment_state = state;
        self.dispatcher.dispatch(BookingEvent::PaymentRecorded {
            booking,
            payment: payment.clone(),
        });
        Ok(Some(payment))
    }

    /// List a booking's payments
    pub async fn list_for_booking(
        &self,
        salon: &Salon,
        booking_id: Uuid,
    ) -> AppResult<Vec<Payment>> {
        // Booking existence doubles as the tenant check
        self.repository.bookings.get_by_id(salon.id, booking_id).await?;
        self.repository.payments.list_for_booking(salon.id, booking_id).await
    }
}
