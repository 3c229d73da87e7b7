//! Post-commit side-effect dispatcher
//!
//! The booking and payment writers hand a typed event to the dispatcher
//! strictly after their transaction commits. Handlers are registered at
//! startup and run as detached tasks; a handler failure is logged and
//! swallowed, never surfaced to the caller and never able to roll back the
//! committed write.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        booking::Booking,
        enums::{BookingStatus, TransitionAction},
        payment::Payment,
    },
};

/// Event emitted after a committed write to the booking aggregate
#[derive(Debug, Clone)]
pub enum BookingEvent {
    Created {
        booking: Booking,
    },
    Rescheduled {
        booking: Booking,
    },
    StatusChanged {
        booking: Booking,
        previous: BookingStatus,
        action: TransitionAction,
    },
    PaymentRecorded {
        booking: Booking,
        payment: Payment,
    },
}

impl BookingEvent {
    pub fn booking(&self) -> &Booking {
        match self {
            BookingEvent::Created { booking }
            | BookingEvent::Rescheduled { booking }
            | BookingEvent::StatusChanged { booking, .. }
            | BookingEvent::PaymentRecorded { booking, .. } => booking,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            BookingEvent::Created { .. } => "created",
            BookingEvent::Rescheduled { .. } => "rescheduled",
            BookingEvent::StatusChanged { .. } => "status_changed",
            BookingEvent::PaymentRecorded { .. } => "payment_recorded",
        }
    }
}

/// A post-commit side effect. Implementations must be safe to retry and
/// must tolerate partial failure of their peers.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn handle(&self, event: &BookingEvent) -> AppResult<()>;
}

/// Dispatches events to the registered handlers as detached tasks
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl Dispatcher {
    pub fn new(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        Self { handlers }
    }

    /// Fire an event after the primary transaction committed. Best effort:
    /// returns immediately, handler errors are logged only.
    pub fn dispatch(&self, event: BookingEvent) {
        for handler in &self.handlers {
            let handler = Arc::clone(handler);
            let event = event.clone();
            tokio::spawn(async move {
                if let Err(e) = handler.handle(&event).await {
                    tracing::warn!(
                        handler = handler.name(),
                        event = event.kind(),
                        booking_id = %event.booking().id,
                        "Side effect failed: {}",
                        e
                    );
                }
            });
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records event kinds it sees; backs dispatcher-related tests.
    #[derive(Default)]
    pub struct RecordingHandler {
        pub seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn handle(&self, event: &BookingEvent) -> AppResult<()> {
            self.seen.lock().unwrap().push(event.kind().to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingHandler;
    use super::*;
    use crate::models::enums::{BookingSource, PaymentState};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn booking() -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            salon_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            start_at: now,
            end_at: now + Duration::minutes(30),
            status: BookingStatus::Confirmed,
            source: BookingSource::Online,
            payment_state: PaymentState::Unpaid,
            service_name: "Cut".to_string(),
            duration_minutes: 30,
            price: 3_000,
            currency: "EUR".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_every_handler() {
        let a = Arc::new(RecordingHandler::default());
        let b = Arc::new(RecordingHandler::default());
        let handlers: Vec<Arc<dyn EventHandler>> = vec![a.clone(), b.clone()];
        let dispatcher = Dispatcher::new(handlers);

        dispatcher.dispatch(BookingEvent::Created { booking: booking() });

        // Handlers run as detached tasks; poll until they have fired
        for _ in 0..100 {
            if !a.seen.lock().unwrap().is_empty() && !b.seen.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(*a.seen.lock().unwrap(), vec!["created".to_string()]);
        assert_eq!(*b.seen.lock().unwrap(), vec!["created".to_string()]);
    }
}
