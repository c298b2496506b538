//! Notification service implementation
//!
//! Email formatting and sending: a keyed template map with `{placeholder}`
//! substitution, delivered over SMTP behind the [`Notifier`] trait. Every
//! send is best-effort; registration and checkout correctness never depend
//! on delivery.

use std::collections::HashMap;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info};

use crate::config::settings::EmailConfig;
use crate::models::event::Event;
use crate::models::registration::Registration;
use crate::models::user::User;
use crate::services::fees::FeeBreakdown;
use crate::utils::errors::{AlumnetError, Result};

/// A fully rendered outbound email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery channel for outbound email
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<()>;
}

/// SMTP delivery via lettre
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: format!("{} <{}>", config.from_name, config.from_address),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| {
                AlumnetError::Config(format!("Invalid from address: {}", e))
            })?)
            .to(email.to.parse().map_err(|e| {
                AlumnetError::InvalidInput(format!("Invalid recipient address: {}", e))
            })?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Email template: subject and body with `{placeholder}` parameters
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    pub key: String,
    pub subject: String,
    pub body: String,
}

/// Notification service for rendering and dispatching member email
pub struct NotificationService {
    notifier: std::sync::Arc<dyn Notifier>,
    templates: HashMap<String, EmailTemplate>,
    enabled: bool,
}

impl NotificationService {
    pub fn new(notifier: std::sync::Arc<dyn Notifier>, enabled: bool) -> Self {
        Self {
            notifier,
            templates: Self::load_default_templates(),
            enabled,
        }
    }

    /// Send a registration confirmation. Failures are logged, never returned.
    pub async fn send_registration_confirmation(
        &self,
        user: &User,
        event: &Event,
        registration: &Registration,
        breakdown: &FeeBreakdown,
    ) {
        let mut parameters = HashMap::new();
        parameters.insert("full_name".to_string(), user.full_name.clone());
        parameters.insert("event_title".to_string(), event.title.clone());
        parameters.insert(
            "event_date".to_string(),
            event.event_date.format("%Y-%m-%d %H:%M UTC").to_string(),
        );
        parameters.insert(
            "total_amount".to_string(),
            format!("{:.2}", breakdown.total),
        );
        parameters.insert(
            "payment_note".to_string(),
            if breakdown.payment_required() {
                format!("Amount due: {:.2}", breakdown.total)
            } else {
                "No payment is required for this event.".to_string()
            },
        );

        self.dispatch("registration_confirmed", &user.email, &parameters, registration.event_id)
            .await;
    }

    /// Send a cancellation notice. Failures are logged, never returned.
    pub async fn send_registration_cancelled(&self, user: &User, event: &Event) {
        let mut parameters = HashMap::new();
        parameters.insert("full_name".to_string(), user.full_name.clone());
        parameters.insert("event_title".to_string(), event.title.clone());

        self.dispatch("registration_cancelled", &user.email, &parameters, event.id)
            .await;
    }

    async fn dispatch(
        &self,
        template_key: &str,
        to: &str,
        parameters: &HashMap<String, String>,
        event_id: i64,
    ) {
        if !self.enabled {
            debug!(template_key = %template_key, "Email notifications disabled, skipping send");
            return;
        }

        let email = match self.render(template_key, to, parameters) {
            Ok(email) => email,
            Err(e) => {
                error!(template_key = %template_key, error = %e, "Failed to render notification");
                return;
            }
        };

        match self.notifier.send(email).await {
            Ok(()) => {
                info!(template_key = %template_key, event_id = event_id, "Notification sent");
            }
            Err(e) => {
                error!(
                    template_key = %template_key,
                    event_id = event_id,
                    error = %e,
                    "Failed to send notification"
                );
            }
        }
    }

    /// Render a template into an outbound email
    fn render(
        &self,
        template_key: &str,
        to: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<OutboundEmail> {
        let template = self.templates.get(template_key).ok_or_else(|| {
            AlumnetError::InvalidInput(format!("Template not found: {}", template_key))
        })?;

        let mut subject = template.subject.clone();
        let mut body = template.body.clone();
        for (key, value) in parameters {
            let placeholder = format!("{{{}}}", key);
            subject = subject.replace(&placeholder, value);
            body = body.replace(&placeholder, value);
        }

        Ok(OutboundEmail {
            to: to.to_string(),
            subject,
            body,
        })
    }

    fn load_default_templates() -> HashMap<String, EmailTemplate> {
        let mut templates = HashMap::new();

        templates.insert(
            "registration_confirmed".to_string(),
            EmailTemplate {
                key: "registration_confirmed".to_string(),
                subject: "Registration confirmed: {event_title}".to_string(),
                body: "Dear {full_name},\n\nYour registration for {event_title} on {event_date} \
                       is confirmed.\n\n{payment_note}\n\nSee you there!\nThe Alumni Association"
                    .to_string(),
            },
        );

        templates.insert(
            "registration_cancelled".to_string(),
            EmailTemplate {
                key: "registration_cancelled".to_string(),
                subject: "Registration cancelled: {event_title}".to_string(),
                body: "Dear {full_name},\n\nYour registration for {event_title} has been \
                       cancelled. We hope to see you at a future event.\n\nThe Alumni Association"
                    .to_string(),
            },
        );

        templates
    }
}
