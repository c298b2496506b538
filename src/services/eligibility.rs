//! Registration eligibility and modification-window checks
//!
//! Both checks are computed fresh on every read from the event row and the
//! clock; nothing here is persisted state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::Event;
use crate::models::registration::{Registration, RegistrationStatus};

/// Whether a user may currently register for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationWindow {
    /// Registration happens on an external site
    External,
    Closed,
    NotStarted,
    Full,
    Open,
}

impl RegistrationWindow {
    /// Human-readable rejection reason for non-open states
    pub fn rejection_reason(&self) -> &'static str {
        match self {
            RegistrationWindow::External => "Registration for this event is handled externally",
            RegistrationWindow::Closed => "Registration for this event is closed",
            RegistrationWindow::NotStarted => "Registration for this event has not started yet",
            RegistrationWindow::Full => "This event has reached its maximum capacity",
            RegistrationWindow::Open => "Registration is open",
        }
    }
}

/// Derive the registration window state for an event.
///
/// The precedence is deliberate and user-visible: an externally-linked
/// event at capacity reports `External`, not `Full`.
pub fn registration_window(
    event: &Event,
    confirmed_count: i64,
    now: DateTime<Utc>,
) -> RegistrationWindow {
    if event.external_link.is_some() {
        return RegistrationWindow::External;
    }

    if !event.has_registration {
        return RegistrationWindow::Closed;
    }

    if now > event.event_date {
        return RegistrationWindow::Closed;
    }

    if let Some(start) = event.registration_start_date {
        if now < start {
            return RegistrationWindow::NotStarted;
        }
    }

    if let Some(end) = event.registration_end_date {
        if now > end {
            return RegistrationWindow::Closed;
        }
    }

    if let Some(capacity) = event.max_capacity {
        if confirmed_count >= capacity as i64 {
            return RegistrationWindow::Full;
        }
    }

    RegistrationWindow::Open
}

/// Why a modification attempt was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationDenied {
    Disabled,
    DeadlinePassed,
    NotConfirmed,
}

impl ModificationDenied {
    pub fn reason(&self) -> &'static str {
        match self {
            ModificationDenied::Disabled => "This event does not allow registration changes",
            ModificationDenied::DeadlinePassed => {
                "The deadline for changing this registration has passed"
            }
            ModificationDenied::NotConfirmed => "Only confirmed registrations can be changed",
        }
    }
}

/// Outcome of the modification-window check, including the computed
/// deadline for client display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModificationWindow {
    pub allowed: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub denied: Option<ModificationDenied>,
}

/// Check whether a registration may still be edited or cancelled.
///
/// Cancellation reuses this check unchanged; there is no separate
/// cancellation deadline.
pub fn modification_window(
    event: &Event,
    registration: &Registration,
    now: DateTime<Utc>,
) -> ModificationWindow {
    let deadline =
        event.event_date - Duration::hours(event.form_modification_deadline_hours as i64);

    if !event.allow_form_modification {
        return ModificationWindow {
            allowed: false,
            deadline: Some(deadline),
            denied: Some(ModificationDenied::Disabled),
        };
    }

    if now > deadline {
        return ModificationWindow {
            allowed: false,
            deadline: Some(deadline),
            denied: Some(ModificationDenied::DeadlinePassed),
        };
    }

    if registration.status() != Some(RegistrationStatus::Confirmed) {
        return ModificationWindow {
            allowed: false,
            deadline: Some(deadline),
            denied: Some(ModificationDenied::NotConfirmed),
        };
    }

    ModificationWindow {
        allowed: true,
        deadline: Some(deadline),
        denied: None,
    }
}
