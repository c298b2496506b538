//! Registration, guest and form-response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub status: String,
    pub payment_status: String,
    pub meal_preference: Option<String>,
    pub registration_fee_paid: f64,
    pub guest_fees_paid: f64,
    pub merchandise_total: f64,
    pub donation_amount: f64,
    pub total_amount: f64,
    pub modification_count: i32,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Guest {
    pub id: i64,
    pub registration_id: i64,
    pub name: String,
    pub meal_preference: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FormResponse {
    pub id: i64,
    pub registration_id: i64,
    pub field_id: i64,
    pub response: String,
}

/// Registration row values computed by the orchestrator before persistence
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: i64,
    pub user_id: i64,
    pub meal_preference: Option<String>,
    pub registration_fee_paid: f64,
    pub donation_amount: f64,
    pub total_amount: f64,
    pub payment_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedResponse {
    pub field_id: i64,
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGuest {
    pub name: String,
    pub meal_preference: Option<String>,
}

/// Partial update applied to a registration within the modification window
#[derive(Debug, Clone, Default)]
pub struct RegistrationChanges {
    pub meal_preference: Option<String>,
    pub donation_amount: Option<f64>,
    pub guest_fees_paid: Option<f64>,
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
    Waitlist,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Waitlist => "waitlist",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "confirmed" => Some(RegistrationStatus::Confirmed),
            "cancelled" => Some(RegistrationStatus::Cancelled),
            "waitlist" => Some(RegistrationStatus::Waitlist),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    NotRequired,
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::NotRequired => "not_required",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_required" => Some(PaymentStatus::NotRequired),
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl Registration {
    pub fn status(&self) -> Option<RegistrationStatus> {
        RegistrationStatus::parse(&self.status)
    }

    pub fn is_confirmed(&self) -> bool {
        self.status() == Some(RegistrationStatus::Confirmed)
    }
}
