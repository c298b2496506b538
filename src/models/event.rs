//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub registration_start_date: Option<DateTime<Utc>>,
    pub registration_end_date: Option<DateTime<Utc>>,
    pub max_capacity: Option<i32>,
    pub registration_fee: f64,
    pub guest_fee: f64,
    pub max_guests_per_registration: i32,
    pub external_link: Option<String>,
    pub has_registration: bool,
    pub has_guests: bool,
    pub has_meals: bool,
    pub has_merchandise: bool,
    pub has_donations: bool,
    pub has_custom_form: bool,
    pub allow_form_modification: bool,
    pub form_modification_deadline_hours: i32,
    pub status: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Custom registration form field attached to an event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FormField {
    pub id: i64,
    pub event_id: i64,
    pub label: String,
    pub field_type: String,
    pub required: bool,
    pub options: Json<Vec<String>>,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub registration_start_date: Option<DateTime<Utc>>,
    pub registration_end_date: Option<DateTime<Utc>>,
    pub max_capacity: Option<i32>,
    pub registration_fee: Option<f64>,
    pub guest_fee: Option<f64>,
    pub max_guests_per_registration: Option<i32>,
    pub external_link: Option<String>,
    pub has_guests: Option<bool>,
    pub has_meals: Option<bool>,
    pub has_merchandise: Option<bool>,
    pub has_donations: Option<bool>,
    pub allow_form_modification: Option<bool>,
    pub form_modification_deadline_hours: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub registration_start_date: Option<DateTime<Utc>>,
    pub registration_end_date: Option<DateTime<Utc>>,
    pub max_capacity: Option<i32>,
    pub registration_fee: Option<f64>,
    pub guest_fee: Option<f64>,
    pub max_guests_per_registration: Option<i32>,
    pub external_link: Option<String>,
    pub has_guests: Option<bool>,
    pub has_meals: Option<bool>,
    pub has_merchandise: Option<bool>,
    pub has_donations: Option<bool>,
    pub allow_form_modification: Option<bool>,
    pub form_modification_deadline_hours: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFormField {
    pub label: String,
    pub field_type: String,
    pub required: bool,
    pub options: Vec<String>,
}

/// Event lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Draft,
    Published,
    RegistrationOpen,
    RegistrationClosed,
    Ongoing,
    Completed,
    Cancelled,
    Archived,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::RegistrationOpen => "registration_open",
            EventStatus::RegistrationClosed => "registration_closed",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(EventStatus::Draft),
            "published" => Some(EventStatus::Published),
            "registration_open" => Some(EventStatus::RegistrationOpen),
            "registration_closed" => Some(EventStatus::RegistrationClosed),
            "ongoing" => Some(EventStatus::Ongoing),
            "completed" => Some(EventStatus::Completed),
            "cancelled" => Some(EventStatus::Cancelled),
            "archived" => Some(EventStatus::Archived),
            _ => None,
        }
    }

    /// Forward lifecycle plus the cancelled/archived side exits
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        use EventStatus::*;
        match (self, next) {
            (Draft, Published) => true,
            (Published, RegistrationOpen) => true,
            (RegistrationOpen, RegistrationClosed) => true,
            (RegistrationClosed, Ongoing) => true,
            (Ongoing, Completed) => true,
            // registration may be reopened before the event starts
            (RegistrationClosed, RegistrationOpen) => true,
            (Draft | Published | RegistrationOpen | RegistrationClosed | Ongoing, Cancelled) => true,
            (Completed | Cancelled, Archived) => true,
            _ => false,
        }
    }

    /// States visible to non-admin members
    pub fn is_visible(&self) -> bool {
        !matches!(self, EventStatus::Draft | EventStatus::Archived)
    }
}

impl Event {
    pub fn status(&self) -> Option<EventStatus> {
        EventStatus::parse(&self.status)
    }
}
