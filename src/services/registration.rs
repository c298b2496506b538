//! Registration service implementation
//!
//! The orchestrator for the registration lifecycle: eligibility check,
//! duplicate check, required-field validation, fee calculation, atomic
//! persistence and the post-commit confirmation email.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::store::{EventStore, RegistrationStore, UserStore};
use crate::models::event::Event;
use crate::models::registration::{
    FormResponse, Guest, NewGuest, NewRegistration, PaymentStatus, Registration,
    RegistrationChanges, SubmittedResponse,
};
use crate::services::eligibility::{
    modification_window, registration_window, ModificationWindow, RegistrationWindow,
};
use crate::services::fees::{fee_breakdown, total_from_components, FeeBreakdown};
use crate::services::notification::NotificationService;
use crate::utils::errors::{AlumnetError, Result};
use crate::utils::logging::log_registration_action;

/// Member-submitted registration request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub meal_preference: Option<String>,
    #[serde(default)]
    pub form_responses: Vec<SubmittedResponse>,
    pub donation_amount: Option<f64>,
    #[serde(default)]
    pub agree_to_terms: bool,
}

/// Member-submitted registration update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMyRegistrationRequest {
    pub meal_preference: Option<String>,
    pub form_responses: Option<Vec<SubmittedResponse>>,
    pub donation_amount: Option<f64>,
}

/// Result of a successful registration
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    pub registration: Registration,
    pub payment_required: bool,
    pub payment_amount: f64,
}

/// A member's registration with its owned rows and the computed
/// modification window
#[derive(Debug, Clone, Serialize)]
pub struct MyRegistration {
    pub registration: Registration,
    pub guests: Vec<Guest>,
    pub form_responses: Vec<FormResponse>,
    pub can_modify: ModificationWindow,
}

/// Registration orchestrator
#[derive(Clone)]
pub struct RegistrationService {
    events: Arc<dyn EventStore>,
    registrations: Arc<dyn RegistrationStore>,
    users: Arc<dyn UserStore>,
    notifications: Arc<NotificationService>,
}

impl RegistrationService {
    pub fn new(
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        users: Arc<dyn UserStore>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            events,
            registrations,
            users,
            notifications,
        }
    }

    /// Load an event visible to members
    async fn visible_event(&self, event_id: i64) -> Result<Event> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(AlumnetError::EventNotFound { event_id })?;

        match event.status() {
            Some(status) if status.is_visible() => Ok(event),
            _ => Err(AlumnetError::EventNotFound { event_id }),
        }
    }

    /// Register the user for an event.
    ///
    /// The registration row and its form responses are persisted as one
    /// transaction; the confirmation email is dispatched after commit and
    /// its failure never propagates to the caller.
    pub async fn register(
        &self,
        event_id: i64,
        user_id: i64,
        request: RegisterRequest,
    ) -> Result<RegistrationOutcome> {
        debug!(event_id = event_id, user_id = user_id, "Processing registration");

        if !request.agree_to_terms {
            return Err(AlumnetError::InvalidInput(
                "You must agree to the event terms to register".to_string(),
            ));
        }

        let event = self.visible_event(event_id).await?;

        let confirmed = self.events.confirmed_count(event_id).await?;
        let window = registration_window(&event, confirmed, Utc::now());
        if window != RegistrationWindow::Open {
            return Err(AlumnetError::RegistrationNotOpen(
                window.rejection_reason().to_string(),
            ));
        }

        if self
            .registrations
            .find_by_event_and_user(event_id, user_id)
            .await?
            .is_some()
        {
            return Err(AlumnetError::DuplicateRegistration { event_id });
        }

        let responses = self.validate_responses(&event, request.form_responses).await?;

        if event.has_meals
            && request
                .meal_preference
                .as_deref()
                .map_or(true, |p| p.trim().is_empty())
        {
            return Err(AlumnetError::InvalidInput(
                "A meal preference is required for this event".to_string(),
            ));
        }

        let donation = if event.has_donations {
            request.donation_amount.unwrap_or(0.0)
        } else {
            0.0
        };
        if donation < 0.0 {
            return Err(AlumnetError::InvalidInput(
                "Donation amount cannot be negative".to_string(),
            ));
        }

        // no guests or merchandise exist yet at creation time
        let breakdown = fee_breakdown(event.registration_fee, 0, event.guest_fee, &[], donation);
        let payment_status = if breakdown.payment_required() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::NotRequired
        };

        let registration = self
            .registrations
            .create_with_responses(
                NewRegistration {
                    event_id,
                    user_id,
                    meal_preference: request.meal_preference,
                    registration_fee_paid: breakdown.registration_fee,
                    donation_amount: breakdown.donation,
                    total_amount: breakdown.total,
                    payment_status: payment_status.as_str().to_string(),
                },
                responses,
            )
            .await?;

        log_registration_action(event_id, user_id, "register", None);
        info!(
            event_id = event_id,
            user_id = user_id,
            registration_id = registration.id,
            total_amount = registration.total_amount,
            "Registration created"
        );

        self.spawn_confirmation(event, registration.clone(), breakdown);

        Ok(RegistrationOutcome {
            payment_required: breakdown.payment_required(),
            payment_amount: breakdown.total,
            registration,
        })
    }

    /// Fetch the caller's registration with guests, responses and the
    /// computed modification window
    pub async fn my_registration(&self, event_id: i64, user_id: i64) -> Result<MyRegistration> {
        let event = self.visible_event(event_id).await?;
        let registration = self
            .registrations
            .find_by_event_and_user(event_id, user_id)
            .await?
            .ok_or(AlumnetError::RegistrationNotFound { event_id })?;

        let guests = self.registrations.active_guests(registration.id).await?;
        let form_responses = self.registrations.responses(registration.id).await?;
        let can_modify = modification_window(&event, &registration, Utc::now());

        Ok(MyRegistration {
            registration,
            guests,
            form_responses,
            can_modify,
        })
    }

    /// Update the caller's registration within the modification window
    pub async fn update_my_registration(
        &self,
        event_id: i64,
        user_id: i64,
        request: UpdateMyRegistrationRequest,
    ) -> Result<Registration> {
        let event = self.visible_event(event_id).await?;
        let registration = self
            .registrations
            .find_by_event_and_user(event_id, user_id)
            .await?
            .ok_or(AlumnetError::RegistrationNotFound { event_id })?;

        self.check_modifiable(&event, &registration)?;

        if event.has_meals {
            if let Some(preference) = &request.meal_preference {
                if preference.trim().is_empty() {
                    return Err(AlumnetError::InvalidInput(
                        "A meal preference is required for this event".to_string(),
                    ));
                }
            }
        }

        let mut changes = RegistrationChanges {
            meal_preference: request.meal_preference,
            ..Default::default()
        };

        if let Some(donation) = request.donation_amount {
            if !event.has_donations {
                return Err(AlumnetError::InvalidInput(
                    "This event does not accept donations".to_string(),
                ));
            }
            if donation < 0.0 {
                return Err(AlumnetError::InvalidInput(
                    "Donation amount cannot be negative".to_string(),
                ));
            }
            changes.donation_amount = Some(donation);
            changes.total_amount = Some(total_from_components(
                registration.registration_fee_paid,
                registration.guest_fees_paid,
                registration.merchandise_total,
                donation,
            ));
        }

        if let Some(responses) = request.form_responses {
            let responses = self.validate_responses(&event, responses).await?;
            self.registrations
                .replace_responses(registration.id, responses)
                .await?;
        }

        let updated = self.registrations.update(registration.id, changes).await?;
        log_registration_action(event_id, user_id, "update", None);

        Ok(updated)
    }

    /// Cancel the caller's registration, gated by the same window as updates
    pub async fn cancel_my_registration(&self, event_id: i64, user_id: i64) -> Result<Registration> {
        let event = self.visible_event(event_id).await?;
        let registration = self
            .registrations
            .find_by_event_and_user(event_id, user_id)
            .await?
            .ok_or(AlumnetError::RegistrationNotFound { event_id })?;

        self.check_modifiable(&event, &registration)?;

        let cancelled = self.registrations.cancel(registration.id).await?;
        log_registration_action(event_id, user_id, "cancel", None);

        let users = Arc::clone(&self.users);
        let notifications = Arc::clone(&self.notifications);
        tokio::spawn(async move {
            if let Ok(Some(user)) = users.find_by_id(user_id).await {
                notifications.send_registration_cancelled(&user, &event).await;
            }
        });

        Ok(cancelled)
    }

    /// Add a guest to the caller's registration and fold the guest fee
    /// into its totals
    pub async fn add_guest(
        &self,
        event_id: i64,
        user_id: i64,
        guest: NewGuest,
    ) -> Result<(Guest, Registration)> {
        let event = self.visible_event(event_id).await?;

        if !event.has_guests {
            return Err(AlumnetError::InvalidInput(
                "This event does not allow guests".to_string(),
            ));
        }

        if guest.name.trim().is_empty() {
            return Err(AlumnetError::InvalidInput(
                "Guest name is required".to_string(),
            ));
        }

        let registration = self
            .registrations
            .find_by_event_and_user(event_id, user_id)
            .await?
            .ok_or(AlumnetError::RegistrationNotFound { event_id })?;

        self.check_modifiable(&event, &registration)?;

        let current = self.registrations.active_guests(registration.id).await?.len() as i32;
        if event.max_guests_per_registration > 0 && current >= event.max_guests_per_registration {
            return Err(AlumnetError::InvalidInput(format!(
                "This event allows at most {} guests per registration",
                event.max_guests_per_registration
            )));
        }

        if event.has_meals
            && guest
                .meal_preference
                .as_deref()
                .map_or(true, |p| p.trim().is_empty())
        {
            return Err(AlumnetError::InvalidInput(
                "A meal preference is required for each guest".to_string(),
            ));
        }

        let created = self.registrations.add_guest(registration.id, guest).await?;
        let updated = self
            .apply_guest_fees(&event, &registration, (current + 1) as u32)
            .await?;

        log_registration_action(event_id, user_id, "add_guest", None);
        Ok((created, updated))
    }

    /// Cancel one of the caller's guests and recompute the totals
    pub async fn remove_guest(
        &self,
        event_id: i64,
        user_id: i64,
        guest_id: i64,
    ) -> Result<Registration> {
        let event = self.visible_event(event_id).await?;
        let registration = self
            .registrations
            .find_by_event_and_user(event_id, user_id)
            .await?
            .ok_or(AlumnetError::RegistrationNotFound { event_id })?;

        self.check_modifiable(&event, &registration)?;

        let guest = self
            .registrations
            .find_guest(guest_id)
            .await?
            .filter(|g| g.registration_id == registration.id)
            .ok_or(AlumnetError::GuestNotFound { guest_id })?;

        if guest.status != "active" {
            return Err(AlumnetError::GuestNotFound { guest_id });
        }

        self.registrations.cancel_guest(guest_id).await?;
        let remaining = self.registrations.active_guests(registration.id).await?.len() as u32;
        let updated = self.apply_guest_fees(&event, &registration, remaining).await?;

        log_registration_action(event_id, user_id, "remove_guest", None);
        Ok(updated)
    }

    /// Admin listing of an event's registrations with registrant details
    pub async fn list_for_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<crate::database::store::RegistrationDetail>> {
        self.registrations.list_for_event(event_id).await
    }

    /// Admin payment-status override
    pub async fn set_payment_status(
        &self,
        registration_id: i64,
        payment_status: &str,
    ) -> Result<Registration> {
        self.registrations
            .find_by_id(registration_id)
            .await?
            .ok_or(AlumnetError::RegistrationMissing { registration_id })?;

        let updated = self
            .registrations
            .set_payment_status(registration_id, payment_status)
            .await?;
        info!(
            registration_id = registration_id,
            payment_status = payment_status,
            "Payment status updated"
        );

        Ok(updated)
    }

    fn check_modifiable(&self, event: &Event, registration: &Registration) -> Result<()> {
        let window = modification_window(event, registration, Utc::now());
        match window.denied {
            None => Ok(()),
            Some(denied) => Err(AlumnetError::ModificationClosed(denied.reason().to_string())),
        }
    }

    /// Recompute guest fees and the total for the given active guest count
    async fn apply_guest_fees(
        &self,
        event: &Event,
        registration: &Registration,
        guest_count: u32,
    ) -> Result<Registration> {
        let guest_fees = guest_count as f64 * event.guest_fee;
        let total = total_from_components(
            registration.registration_fee_paid,
            guest_fees,
            registration.merchandise_total,
            registration.donation_amount,
        );

        self.registrations
            .update(
                registration.id,
                RegistrationChanges {
                    guest_fees_paid: Some(guest_fees),
                    total_amount: Some(total),
                    ..Default::default()
                },
            )
            .await
    }

    /// Reject unknown field ids and missing required fields, naming the
    /// missing labels
    async fn validate_responses(
        &self,
        event: &Event,
        responses: Vec<SubmittedResponse>,
    ) -> Result<Vec<SubmittedResponse>> {
        let fields = self.events.form_fields(event.id).await?;
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let by_id: HashMap<i64, &crate::models::event::FormField> =
            fields.iter().map(|f| (f.id, f)).collect();

        for response in &responses {
            if !by_id.contains_key(&response.field_id) {
                return Err(AlumnetError::InvalidInput(format!(
                    "Unknown form field: {}",
                    response.field_id
                )));
            }
        }

        let answered: HashMap<i64, &str> = responses
            .iter()
            .map(|r| (r.field_id, r.response.as_str()))
            .collect();

        let missing: Vec<String> = fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| {
                answered
                    .get(&f.id)
                    .map_or(true, |response| response.trim().is_empty())
            })
            .map(|f| f.label.clone())
            .collect();

        if !missing.is_empty() {
            return Err(AlumnetError::MissingRequiredFields { labels: missing });
        }

        Ok(responses)
    }

    fn spawn_confirmation(
        &self,
        event: Event,
        registration: Registration,
        breakdown: FeeBreakdown,
    ) {
        let users = Arc::clone(&self.users);
        let notifications = Arc::clone(&self.notifications);
        tokio::spawn(async move {
            match users.find_by_id(registration.user_id).await {
                Ok(Some(user)) => {
                    notifications
                        .send_registration_confirmation(&user, &event, &registration, &breakdown)
                        .await;
                }
                Ok(None) => {
                    tracing::warn!(
                        user_id = registration.user_id,
                        "Registered user missing, skipping confirmation email"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = registration.user_id,
                        error = %e,
                        "Failed to load user for confirmation email"
                    );
                }
            }
        });
    }
}
