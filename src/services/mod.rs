//! Business logic services

pub mod analytics;
pub mod availability;
pub mod bookings;
pub mod commissions;
pub mod customers;
pub mod dispatcher;
pub mod idempotency;
pub mod notifications;
pub mod payments;
pub mod salons;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

use analytics::{AnalyticsHandler, AnalyticsResync, HttpAnalyticsClient, NoopAnalyticsClient};
use commissions::CommissionHandler;
use dispatcher::{Dispatcher, EventHandler};
use notifications::{
    NotificationHandler, NotificationSender, NoopNotificationSender, SmtpNotificationSender,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub salons: salons::SalonsService,
    pub availability: availability::AvailabilityService,
    pub customers: customers::CustomersService,
    pub bookings: bookings::BookingsService,
    pub payments: payments::PaymentsService,
    pub commissions: commissions::CommissionsService,
    pub idempotency: idempotency::IdempotencyService,
}

impl Services {
    /// Create all services with the given repository. Side-effect handlers
    /// are registered here, once, at startup.
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let customers = customers::CustomersService::new(repository.clone());
        let commissions = commissions::CommissionsService::new(repository.clone());

        let sender: Arc<dyn NotificationSender> = if config.notifications.enabled {
            Arc::new(SmtpNotificationSender::new(config.notifications.clone()))
        } else {
            Arc::new(NoopNotificationSender)
        };
        let analytics_client: Arc<dyn AnalyticsResync> = if config.analytics.enabled {
            Arc::new(HttpAnalyticsClient::new(config.analytics.clone()))
        } else {
            Arc::new(NoopAnalyticsClient)
        };

        let handlers: Vec<Arc<dyn EventHandler>> = vec![
            Arc::new(NotificationHandler::new(repository.clone(), sender)),
            Arc::new(AnalyticsHandler::new(analytics_client)),
            Arc::new(CommissionHandler::new(commissions.clone())),
        ];
        let dispatcher = Dispatcher::new(handlers);

        Self {
            salons: salons::SalonsService::new(repository.clone()),
            availability: availability::AvailabilityService::new(
                repository.clone(),
                config.booking.clone(),
            ),
            customers: customers.clone(),
            bookings: bookings::BookingsService::new(
                repository.clone(),
                customers,
                dispatcher.clone(),
                config.database.statement_timeout_ms,
            ),
            payments: payments::PaymentsService::new(repository.clone(), dispatcher),
            commissions,
            idempotency: idempotency::IdempotencyService::new(repository, &config.booking),
        }
    }
}
