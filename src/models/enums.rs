//! Shared domain enums and lifecycle state machines

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// BookingStatus
// ---------------------------------------------------------------------------

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Done,
    Canceled,
    NoShow,
}

/// Lifecycle action requested on a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    Confirm,
    Cancel,
    Complete,
    NoShow,
}

impl BookingStatus {
    /// Terminal states admit no further status transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Done | BookingStatus::Canceled | BookingStatus::NoShow
        )
    }

    /// Whether a booking in this status counts toward the staff non-overlap
    /// invariant.
    pub fn holds_calendar(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Done
        )
    }

    /// The target status for an action, if the edge is in the allowed set.
    pub fn transition(&self, action: TransitionAction) -> Option<BookingStatus> {
        match (self, action) {
            (BookingStatus::Pending, TransitionAction::Confirm) => Some(BookingStatus::Confirmed),
            (BookingStatus::Pending, TransitionAction::Cancel) => Some(BookingStatus::Canceled),
            (BookingStatus::Confirmed, TransitionAction::Cancel) => Some(BookingStatus::Canceled),
            (BookingStatus::Confirmed, TransitionAction::Complete) => Some(BookingStatus::Done),
            (BookingStatus::Confirmed, TransitionAction::NoShow) => Some(BookingStatus::NoShow),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Done => "done",
            BookingStatus::Canceled => "canceled",
            BookingStatus::NoShow => "no_show",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// BookingSource
// ---------------------------------------------------------------------------

/// How the booking entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    Online,
    InPerson,
}

// ---------------------------------------------------------------------------
// PaymentStatus
// ---------------------------------------------------------------------------

/// Status of an individual payment row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Initiated,
    Pending,
    Paid,
    Failed,
    Canceled,
    Refunded,
    Void,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Failed
                | PaymentStatus::Canceled
                | PaymentStatus::Refunded
                | PaymentStatus::Void
        )
    }

    /// Directed transition table. Refunded is reachable only from Paid.
    pub fn can_transition(&self, to: PaymentStatus) -> bool {
        match (self, to) {
            (PaymentStatus::Initiated, PaymentStatus::Pending)
            | (PaymentStatus::Initiated, PaymentStatus::Paid)
            | (PaymentStatus::Initiated, PaymentStatus::Failed)
            | (PaymentStatus::Initiated, PaymentStatus::Canceled)
            | (PaymentStatus::Initiated, PaymentStatus::Void)
            | (PaymentStatus::Pending, PaymentStatus::Paid)
            | (PaymentStatus::Pending, PaymentStatus::Failed)
            | (PaymentStatus::Pending, PaymentStatus::Canceled)
            | (PaymentStatus::Pending, PaymentStatus::Void)
            | (PaymentStatus::Paid, PaymentStatus::Refunded) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// PaymentState (derived booking rollup)
// ---------------------------------------------------------------------------

/// Aggregate payment state of a booking, derived from its payment ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Unpaid,
    PartiallyPaid,
    Paid,
    Overpaid,
    Refunded,
}

/// Recompute a booking's aggregate payment state from its full ledger.
///
/// Always a full recomputation over (status, amount) pairs; incremental
/// patching drifts when rows are refunded out of order.
pub fn derive_payment_state(amount_due: i64, ledger: &[(PaymentStatus, i64)]) -> PaymentState {
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
    let net = paid - refunded;

    if net <= 0 && refunded > 0 {
        PaymentState::Refunded
    } else if net <= 0 {
        PaymentState::Unpaid
    } else if net < amount_due {
        PaymentState::PartiallyPaid
    } else if net == amount_due {
        PaymentState::Paid
    } else {
        PaymentState::Overpaid
    }
}

// ---------------------------------------------------------------------------
// CommissionStatus / CommissionKind
// ---------------------------------------------------------------------------

/// Platform commission lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "commission_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Accrued,
    Charged,
    Waived,
}

impl CommissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommissionStatus::Charged | CommissionStatus::Waived)
    }

    pub fn can_transition(&self, to: CommissionStatus) -> bool {
        match (self, to) {
            (CommissionStatus::Pending, CommissionStatus::Accrued)
            | (CommissionStatus::Pending, CommissionStatus::Charged)
            | (CommissionStatus::Pending, CommissionStatus::Waived)
            | (CommissionStatus::Accrued, CommissionStatus::Charged)
            | (CommissionStatus::Accrued, CommissionStatus::Waived) => true,
            _ => false,
        }
    }
}

/// How a salon's commission is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "commission_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommissionKind {
    Percent,
    Fixed,
}

// ---------------------------------------------------------------------------
// IdempotencyStatus
// ---------------------------------------------------------------------------

/// Status of an idempotency key record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "idempotency_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyStatus {
    InProgress,
    Completed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_allowed_edges() {
        use BookingStatus::*;
        use TransitionAction::*;

        assert_eq!(Pending.transition(Confirm), Some(Confirmed));
        assert_eq!(Pending.transition(Cancel), Some(Canceled));
        assert_eq!(Confirmed.transition(Cancel), Some(Canceled));
        assert_eq!(Confirmed.transition(Complete), Some(Done));
        assert_eq!(
            Confirmed.transition(TransitionAction::NoShow),
            Some(BookingStatus::NoShow)
        );

        // Non-listed edges are rejected, not ignored
        assert_eq!(Pending.transition(Complete), None);
        assert_eq!(Pending.transition(TransitionAction::NoShow), None);
        assert_eq!(Confirmed.transition(Confirm), None);
    }

    #[test]
    fn test_booking_terminal_states_reject_every_action() {
        use TransitionAction::*;
        for status in [
            BookingStatus::Done,
            BookingStatus::Canceled,
            BookingStatus::NoShow,
        ] {
            assert!(status.is_terminal());
            for action in [Confirm, Cancel, Complete, NoShow] {
                assert_eq!(status.transition(action), None);
            }
        }
    }

    #[test]
    fn test_holds_calendar_set() {
        assert!(BookingStatus::Pending.holds_calendar());
        assert!(BookingStatus::Confirmed.holds_calendar());
        assert!(BookingStatus::Done.holds_calendar());
        assert!(!BookingStatus::Canceled.holds_calendar());
        assert!(!BookingStatus::NoShow.holds_calendar());
    }

    #[test]
    fn test_payment_status_transitions() {
        use PaymentStatus::*;

        assert!(Initiated.can_transition(Pending));
        assert!(Pending.can_transition(Paid));
        assert!(Paid.can_transition(Refunded));

        // Refunded only reachable from Paid
        assert!(!Initiated.can_transition(Refunded));
        assert!(!Pending.can_transition(Refunded));
        assert!(!Failed.can_transition(Refunded));

        // Terminal states admit nothing
        for terminal in [Failed, Canceled, Refunded, Void] {
            assert!(terminal.is_terminal());
            for target in [Initiated, Pending, Paid, Failed, Canceled, Refunded, Void] {
                assert!(!terminal.can_transition(target));
            }
        }
    }

    #[test]
    fn test_derive_payment_state_ledger_walk() {
        use PaymentStatus::*;
        let due = 100_000;

        assert_eq!(derive_payment_state(due, &[]), PaymentState::Unpaid);
        assert_eq!(
            derive_payment_state(due, &[(Paid, 50_000)]),
            PaymentState::PartiallyPaid
        );
        assert_eq!(
            derive_payment_state(due, &[(Paid, 50_000), (Paid, 50_000)]),
            PaymentState::Paid
        );
        assert_eq!(
            derive_payment_state(due, &[(Paid, 50_000), (Paid, 50_000), (Paid, 10_000)]),
            PaymentState::Overpaid
        );
        assert_eq!(
            derive_payment_state(
                due,
                &[(Paid, 50_000), (Paid, 50_000), (Refunded, 100_000)]
            ),
            PaymentState::Refunded
        );
    }

    #[test]
    fn test_derive_payment_state_ignores_non_settled_rows() {
        use PaymentStatus::*;
        let ledger = [(Initiated, 100_000), (Failed, 100_000), (Pending, 100_000)];
        assert_eq!(derive_payment_state(100_000, &ledger), PaymentState::Unpaid);
    }

    #[test]
    fn test_commission_transitions() {
        use CommissionStatus::*;
        assert!(Pending.can_transition(Charged));
        assert!(Pending.can_transition(Waived));
        assert!(Accrued.can_transition(Charged));
        assert!(!Charged.can_transition(Waived));
        assert!(!Waived.can_transition(Charged));
        assert!(!Pending.can_transition(Pending));
    }
}
