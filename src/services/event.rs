//! Event service implementation
//!
//! Admin-side event lifecycle (create, update, status transitions, delete
//! guard, form definition) and the member-facing event reads with their
//! computed registration window.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::store::EventStore;
use crate::models::event::{
    CreateEventRequest, Event, EventStatus, FormField, NewFormField, UpdateEventRequest,
};
use crate::services::eligibility::{registration_window, RegistrationWindow};
use crate::utils::errors::{AlumnetError, Result};
use crate::utils::helpers::{slug_with_suffix, slugify};
use crate::utils::logging::log_admin_action;

const FORM_FIELD_TYPES: [&str; 3] = ["text", "select", "checkbox"];

/// Event detail as served to members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetail {
    pub event: Event,
    pub registration_window: RegistrationWindow,
    pub confirmed_count: i64,
    pub spots_remaining: Option<i64>,
    pub form_fields: Vec<FormField>,
}

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    /// Create a draft event with a unique slug derived from the title
    pub async fn create(&self, created_by: i64, request: CreateEventRequest) -> Result<Event> {
        validate_event_numbers(
            request.registration_fee,
            request.guest_fee,
            request.max_capacity,
        )?;

        if request.title.trim().is_empty() {
            return Err(AlumnetError::InvalidInput(
                "Event title is required".to_string(),
            ));
        }

        if request.event_date < Utc::now() {
            return Err(AlumnetError::InvalidInput(
                "Event date must be in the future".to_string(),
            ));
        }

        let mut slug = slugify(&request.title);
        if self.events.find_by_slug(&slug).await?.is_some() {
            slug = slug_with_suffix(&slug);
        }

        let event = self.events.create(slug, created_by, request).await?;
        log_admin_action(created_by, "create_event", Some(&event.slug), None);
        info!(event_id = event.id, slug = %event.slug, "Event created");

        Ok(event)
    }

    pub async fn update(&self, event_id: i64, request: UpdateEventRequest) -> Result<Event> {
        validate_event_numbers(
            request.registration_fee,
            request.guest_fee,
            request.max_capacity,
        )?;

        self.require(event_id).await?;
        let event = self.events.update(event_id, request).await?;
        debug!(event_id = event_id, "Event updated");

        Ok(event)
    }

    /// Delete an event, refused while any registration row exists
    pub async fn delete(&self, event_id: i64, admin_id: i64) -> Result<()> {
        self.require(event_id).await?;

        let registrations = self.events.registration_count(event_id).await?;
        if registrations > 0 {
            return Err(AlumnetError::EventHasRegistrations { event_id });
        }

        self.events.delete(event_id).await?;
        log_admin_action(admin_id, "delete_event", Some(&event_id.to_string()), None);

        Ok(())
    }

    /// Move the event through its lifecycle, validating the transition
    pub async fn set_status(&self, event_id: i64, next: &str) -> Result<Event> {
        let event = self.require(event_id).await?;

        let next_status = EventStatus::parse(next)
            .ok_or_else(|| AlumnetError::InvalidInput(format!("Unknown status: {}", next)))?;
        let current = event.status().ok_or_else(|| {
            AlumnetError::InvalidInput(format!("Event has unknown status: {}", event.status))
        })?;

        if !current.can_transition_to(next_status) {
            return Err(AlumnetError::InvalidStateTransition {
                from: current.as_str().to_string(),
                to: next_status.as_str().to_string(),
            });
        }

        let updated = self.events.set_status(event_id, next_status.as_str()).await?;
        info!(event_id = event_id, from = current.as_str(), to = next_status.as_str(), "Event status changed");

        Ok(updated)
    }

    /// Replace the event's registration form definition
    pub async fn replace_form(
        &self,
        event_id: i64,
        fields: Vec<NewFormField>,
    ) -> Result<Vec<FormField>> {
        self.require(event_id).await?;

        for field in &fields {
            if field.label.trim().is_empty() {
                return Err(AlumnetError::InvalidInput(
                    "Form field labels cannot be empty".to_string(),
                ));
            }
            if !FORM_FIELD_TYPES.contains(&field.field_type.as_str()) {
                return Err(AlumnetError::InvalidInput(format!(
                    "Unknown form field type: {}. Valid types: {:?}",
                    field.field_type, FORM_FIELD_TYPES
                )));
            }
            if field.field_type == "select" && field.options.is_empty() {
                return Err(AlumnetError::InvalidInput(format!(
                    "Select field '{}' needs at least one option",
                    field.label
                )));
            }
        }

        self.events.replace_form_fields(event_id, fields).await
    }

    /// Member-visible event listing
    pub async fn list_visible(&self, limit: i64, offset: i64) -> Result<Vec<Event>> {
        self.events.list_visible(limit, offset).await
    }

    /// Member-visible event detail with the computed registration window
    pub async fn detail(&self, event_id: i64) -> Result<EventDetail> {
        let event = self.require(event_id).await?;

        match event.status() {
            Some(status) if status.is_visible() => {}
            _ => return Err(AlumnetError::EventNotFound { event_id }),
        }

        let confirmed_count = self.events.confirmed_count(event_id).await?;
        let window = registration_window(&event, confirmed_count, Utc::now());
        let spots_remaining = event
            .max_capacity
            .map(|capacity| (capacity as i64 - confirmed_count).max(0));
        let form_fields = self.events.form_fields(event_id).await?;

        Ok(EventDetail {
            event,
            registration_window: window,
            confirmed_count,
            spots_remaining,
            form_fields,
        })
    }

    /// Admin read without the visibility filter
    pub async fn require(&self, event_id: i64) -> Result<Event> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(AlumnetError::EventNotFound { event_id })
    }
}

fn validate_event_numbers(
    registration_fee: Option<f64>,
    guest_fee: Option<f64>,
    max_capacity: Option<i32>,
) -> Result<()> {
    if registration_fee.is_some_and(|fee| fee < 0.0) {
        return Err(AlumnetError::InvalidInput(
            "Registration fee cannot be negative".to_string(),
        ));
    }
    if guest_fee.is_some_and(|fee| fee < 0.0) {
        return Err(AlumnetError::InvalidInput(
            "Guest fee cannot be negative".to_string(),
        ));
    }
    if max_capacity.is_some_and(|capacity| capacity <= 0) {
        return Err(AlumnetError::InvalidInput(
            "Capacity must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
