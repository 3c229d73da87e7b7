//! Platform commission calculation and settlement
//!
//! Commissions accrue only for ONLINE-source bookings under the salon's
//! policy, triggered by completion or payment capture. Calculation is
//! idempotent: the unique booking_id constraint makes retried triggers
//! converge on one commission row.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::Booking,
        commission::{BookingCommission, CommissionAction, CommissionPayment},
        enums::{BookingSource, CommissionKind, CommissionStatus, PaymentState, TransitionAction},
        payment::MANUAL_PROVIDER,
        salon::Salon,
    },
    repository::Repository,
    services::dispatcher::{BookingEvent, EventHandler},
};

/// Provider recorded on auto-settled commission payments
const AUTO_PROVIDER: &str = "auto";

/// A salon's commission policy, extracted from its configuration row
#[derive(Debug, Clone, Copy)]
pub struct CommissionPolicy {
    pub kind: CommissionKind,
    pub percent_bps: i32,
    pub fixed_amount: i64,
    pub minimum_fee: i64,
}

impl CommissionPolicy {
    pub fn from_salon(salon: &Salon) -> Option<Self> {
        salon.commission_kind.map(|kind| Self {
            kind,
            percent_bps: salon.commission_percent_bps.unwrap_or(0),
            fixed_amount: salon.commission_fixed_amount.unwrap_or(0),
            minimum_fee: salon.commission_minimum_fee,
        })
    }
}

/// Commission owed for a booking of the given price (minor units).
/// Percent policies use basis-point precision with a minimum fee floor.
pub fn commission_amount(policy: &CommissionPolicy, price: i64) -> i64 {
    match policy.kind {
        CommissionKind::Percent => {
            let percent = price * policy.percent_bps as i64 / 10_000;
            percent.max(policy.minimum_fee)
        }
        CommissionKind::Fixed => policy.fixed_amount,
    }
}

#[derive(Clone)]
pub struct CommissionsService {
    repository: Repository,
}

impl CommissionsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get a booking's commission with its payments
    pub async fn get_for_booking(
        &self,
        salon_id: Uuid,
        booking_id: Uuid,
    ) -> AppResult<(BookingCommission, Vec<CommissionPayment>)> {
        let commission = self
            .repository
            .commissions
            .get_by_booking(salon_id, booking_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No commission for booking {}", booking_id))
            })?;
        let payments = self
            .repository
            .commissions
            .list_payments(salon_id, commission.id)
            .await?;
        Ok((commission, payments))
    }

    /// Compute and persist the commission for a booking if the salon policy
    /// applies. Auto-settles to CHARGED when the booking is already fully
    /// paid through a non-manual provider at calculation time; otherwise
    /// the commission stays PENDING for the operator.
    ///
    /// Safe to call repeatedly for the same booking.
    pub async fn calculate_for_booking(
        &self,
        booking: &Booking,
    ) -> AppResult<Option<BookingCommission>> {
        if booking.source != BookingSource::Online {
            return Ok(None);
        }
        let salon = self.repository.salons.get_by_id(booking.salon_id).await?;
        let Some(policy) = CommissionPolicy::from_salon(&salon) else {
            return Ok(None);
        };

        let amount = commission_amount(&policy, booking.price);
        let auto_settle = booking.payment_state == PaymentState::Paid
            && self
                .repository
                .payments
                .has_non_manual_paid(booking.id)
                .await?;
        let status = if auto_settle {
            CommissionStatus::Charged
        } else {
            CommissionStatus::Pending
        };

        let mut tx = self.repository.pool.begin().await?;
        let inserted = self
            .repository
            .commissions
            .insert_if_absent(
                tx.as_mut(),
                booking.salon_id,
                booking.id,
                amount,
                &booking.currency,
                status,
                policy.kind,
                match policy.kind {
                    CommissionKind::Percent => Some(policy.percent_bps),
                    CommissionKind::Fixed => None,
                },
            )
            .await?;

        let Some(commission) = inserted else {
            // Another trigger created it first
            tx.rollback().await?;
            return Ok(None);
        };

        if auto_settle {
            self.repository
                .commissions
                .insert_payment(
                    tx.as_mut(),
                    booking.salon_id,
                    commission.id,
                    amount,
                    AUTO_PROVIDER,
                )
                .await?;
        }
        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            amount,
            status = ?commission.status,
            "Commission calculated"
        );
        Ok(Some(commission))
    }

    /// Operator transition on a commission. Charging records a matching
    /// manual commission payment.
    pub async fn transition(
        &self,
        salon_id: Uuid,
        commission_id: Uuid,
        action: CommissionAction,
    ) -> AppResult<BookingCommission> {
        let target = match action {
            CommissionAction::Accrue => CommissionStatus::Accrued,
            CommissionAction::Charge => CommissionStatus::Charged,
            CommissionAction::Waive => CommissionStatus::Waived,
        };

        let mut tx = self.repository.pool.begin().await?;
        let commission = self
            .repository
            .commissions
            .get_for_update(tx.as_mut(), salon_id, commission_id)
            .await?;

        if !commission.status.can_transition(target) {
            return Err(AppError::InvalidTransition(format!(
                "Commission cannot move from {:?} to {:?}",
                commission.status, target
            )));
        }

        let updated = self
            .repository
            .commissions
            .set_status(tx.as_mut(), commission.id, target)
            .await?;
        if target == CommissionStatus::Charged {
            self.repository
                .commissions
                .insert_payment(
                    tx.as_mut(),
                    salon_id,
                    commission.id,
                    commission.amount,
                    MANUAL_PROVIDER,
                )
                .await?;
        }
        tx.commit().await?;
        Ok(updated)
    }
}

/// Dispatcher handler: commission triggers are booking completion and
/// payment capture.
pub struct CommissionHandler {
    service: CommissionsService,
}

impl CommissionHandler {
    pub fn new(service: CommissionsService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for CommissionHandler {
    fn name(&self) -> &'static str {
        "commission"
    }

    async fn handle(&self, event: &BookingEvent) -> AppResult<()> {
        let triggered = match event {
            BookingEvent::StatusChanged { action, .. } => *action == TransitionAction::Complete,
            BookingEvent::PaymentRecorded { payment, .. } => {
                payment.status == crate::models::enums::PaymentStatus::Paid
            }
            _ => false,
        };
        if triggered {
            self.service.calculate_for_booking(event.booking()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percent_policy(bps: i32, minimum_fee: i64) -> CommissionPolicy {
        CommissionPolicy {
            kind: CommissionKind::Percent,
            percent_bps: bps,
            fixed_amount: 0,
            minimum_fee,
        }
    }

    #[test]
    fn test_percent_commission_basis_points() {
        // 5% of 10000 minor units
        assert_eq!(commission_amount(&percent_policy(500, 0), 10_000), 500);
        // Basis points give sub-percent precision
        assert_eq!(commission_amount(&percent_policy(125, 0), 80_000), 1_000);
        // Integer division truncates
        assert_eq!(commission_amount(&percent_policy(333, 0), 100), 3);
    }

    #[test]
    fn test_minimum_fee_floor() {
        assert_eq!(commission_amount(&percent_policy(100, 250), 10_000), 250);
        assert_eq!(commission_amount(&percent_policy(100, 250), 100_000), 1_000);
    }

    #[test]
    fn test_fixed_commission_ignores_price() {
        let policy = CommissionPolicy {
            kind: CommissionKind::Fixed,
            percent_bps: 0,
            fixed_amount: 199,
            minimum_fee: 0,
        };
        assert_eq!(commission_amount(&policy, 10_000), 199);
        assert_eq!(commission_amount(&policy, 1), 199);
    }
}
