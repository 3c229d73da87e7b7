//! Customer notification side effect
//!
//! Delivery transport is an external collaborator: the core only knows the
//! `NotificationSender` interface. The SMTP implementation relays template
//! messages through an SMS-over-SMTP gateway; failures are logged by the
//! dispatcher and never reach the booking transaction.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::{
    config::NotificationsConfig,
    error::{AppError, AppResult},
    repository::Repository,
    services::dispatcher::{BookingEvent, EventHandler},
};

/// Message templates understood by the delivery gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    BookingCreated,
    BookingRescheduled,
    BookingConfirmed,
    BookingCanceled,
}

impl Template {
    pub fn id(&self) -> &'static str {
        match self {
            Template::BookingCreated => "booking_created",
            Template::BookingRescheduled => "booking_rescheduled",
            Template::BookingConfirmed => "booking_confirmed",
            Template::BookingCanceled => "booking_canceled",
        }
    }
}

/// Fire-and-forget notification delivery
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        template: Template,
        params: &BTreeMap<String, String>,
    ) -> AppResult<()>;
}

/// Relays notifications through an SMTP gateway
pub struct SmtpNotificationSender {
    config: NotificationsConfig,
}

impl SmtpNotificationSender {
    pub fn new(config: NotificationsConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> AppResult<SmtpTransport> {
        let mut builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        };
        builder = builder.port(self.config.smtp_port);
        if let (Some(user), Some(pass)) = (
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        ) {
            builder = builder.credentials(Credentials::new(user, pass));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send(
        &self,
        recipient: &str,
        template: Template,
        params: &BTreeMap<String, String>,
    ) -> AppResult<()> {
        let from = Mailbox::from_str(&self.config.smtp_from)
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;
        // Gateway addressing: <canonical phone without '+'>@<gateway domain>
        let to_addr = format!(
            "{}@{}",
            recipient.trim_start_matches('+'),
            self.config.gateway_domain
        );
        let to = Mailbox::from_str(&to_addr)
            .map_err(|e| AppError::Internal(format!("Invalid recipient address: {}", e)))?;

        let body = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("\n");

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(template.id())
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Internal(format!("Failed to build message: {}", e)))?;

        let transport = self.transport()?;
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Send task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("SMTP send failed: {}", e)))?;
        Ok(())
    }
}

/// Sender used when notifications are disabled
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn send(
        &self,
        recipient: &str,
        template: Template,
        _params: &BTreeMap<String, String>,
    ) -> AppResult<()> {
        tracing::debug!(recipient, template = template.id(), "Notification suppressed");
        Ok(())
    }
}

/// Dispatcher handler translating booking events into customer messages
pub struct NotificationHandler {
    repository: Repository,
    sender: std::sync::Arc<dyn NotificationSender>,
}

impl NotificationHandler {
    pub fn new(repository: Repository, sender: std::sync::Arc<dyn NotificationSender>) -> Self {
        Self { repository, sender }
    }

    fn template_for(event: &BookingEvent) -> Option<Template> {
        use crate::models::enums::TransitionAction;
        match event {
            BookingEvent::Created { .. } => Some(Template::BookingCreated),
            BookingEvent::Rescheduled { .. } => Some(Template::BookingRescheduled),
            BookingEvent::StatusChanged { action, .. } => match action {
                TransitionAction::Confirm => Some(Template::BookingConfirmed),
                TransitionAction::Cancel => Some(Template::BookingCanceled),
                _ => None,
            },
            BookingEvent::PaymentRecorded { .. } => None,
        }
    }
}

#[async_trait]
impl EventHandler for NotificationHandler {
    fn name(&self) -> &'static str {
        "notification"
    }

    async fn handle(&self, event: &BookingEvent) -> AppResult<()> {
        let Some(template) = Self::template_for(event) else {
            return Ok(());
        };
        let booking = event.booking();
        let customer = self
            .repository
            .customers
            .get_by_id(booking.salon_id, booking.customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer record missing".to_string()))?;

        let mut params = BTreeMap::new();
        params.insert("service".to_string(), booking.service_name.clone());
        params.insert("start_at".to_string(), booking.start_at.to_rfc3339());
        params.insert("customer".to_string(), customer.display_name.clone());

        self.sender.send(&customer.phone, template, &params).await
    }
}
