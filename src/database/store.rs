//! Store interfaces for the persistence layer
//!
//! Services depend on these traits rather than on the sqlx repositories
//! directly, so tests can substitute in-memory implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{
    CartLine, CheckoutOutcome, CreateEventRequest, CreateMerchandiseItemRequest, Event, FormField,
    FormResponse, Guest, MerchandiseItem, NewCartLine, NewFormField, NewGuest, NewRegistration,
    Registration, RegistrationChanges, SubmittedResponse, UpdateEventRequest,
    UpdateMerchandiseItemRequest, User,
};
use crate::utils::errors::Result;

/// A registration joined with the registrant's account fields,
/// as returned to admin listings and exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationDetail {
    pub registration: Registration,
    pub user_email: String,
    pub user_full_name: String,
    pub guest_count: i64,
}

/// Aggregate counters for the admin dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationTotals {
    pub total: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub revenue: f64,
}

/// Per-status event counts for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create(&self, slug: String, created_by: i64, request: CreateEventRequest)
        -> Result<Event>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Event>>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>>;
    /// Events in member-visible states, soonest first
    async fn list_visible(&self, limit: i64, offset: i64) -> Result<Vec<Event>>;
    async fn update(&self, id: i64, request: UpdateEventRequest) -> Result<Event>;
    async fn set_status(&self, id: i64, status: &str) -> Result<Event>;
    async fn delete(&self, id: i64) -> Result<()>;
    /// All registration rows for the event, cancelled included (delete guard)
    async fn registration_count(&self, event_id: i64) -> Result<i64>;
    async fn confirmed_count(&self, event_id: i64) -> Result<i64>;
    async fn form_fields(&self, event_id: i64) -> Result<Vec<FormField>>;
    async fn replace_form_fields(
        &self,
        event_id: i64,
        fields: Vec<NewFormField>,
    ) -> Result<Vec<FormField>>;
    async fn count_by_status(&self) -> Result<Vec<StatusCount>>;
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Registration>>;
    async fn find_by_event_and_user(&self, event_id: i64, user_id: i64)
        -> Result<Option<Registration>>;
    /// Persist the registration and its form responses as one transaction
    async fn create_with_responses(
        &self,
        registration: NewRegistration,
        responses: Vec<SubmittedResponse>,
    ) -> Result<Registration>;
    /// Apply changes and bump the modification counter
    async fn update(&self, id: i64, changes: RegistrationChanges) -> Result<Registration>;
    async fn replace_responses(&self, id: i64, responses: Vec<SubmittedResponse>) -> Result<()>;
    /// Cancel the registration and its active guests
    async fn cancel(&self, id: i64) -> Result<Registration>;
    async fn add_guest(&self, registration_id: i64, guest: NewGuest) -> Result<Guest>;
    async fn find_guest(&self, guest_id: i64) -> Result<Option<Guest>>;
    async fn cancel_guest(&self, guest_id: i64) -> Result<Guest>;
    async fn active_guests(&self, registration_id: i64) -> Result<Vec<Guest>>;
    async fn responses(&self, registration_id: i64) -> Result<Vec<FormResponse>>;
    async fn set_payment_status(&self, id: i64, payment_status: &str) -> Result<Registration>;
    async fn list_for_event(&self, event_id: i64) -> Result<Vec<RegistrationDetail>>;
    async fn totals(&self) -> Result<RegistrationTotals>;
}

#[async_trait]
pub trait MerchandiseStore: Send + Sync {
    async fn list_items(&self, event_id: i64, only_active: bool) -> Result<Vec<MerchandiseItem>>;
    async fn find_item(&self, item_id: i64) -> Result<Option<MerchandiseItem>>;
    async fn create_item(
        &self,
        event_id: i64,
        request: CreateMerchandiseItemRequest,
    ) -> Result<MerchandiseItem>;
    async fn update_item(
        &self,
        item_id: i64,
        request: UpdateMerchandiseItemRequest,
    ) -> Result<MerchandiseItem>;
    /// Lines still in the cart (not yet ordered)
    async fn cart(&self, registration_id: i64) -> Result<Vec<CartLine>>;
    async fn find_cart_line(&self, line_id: i64) -> Result<Option<CartLine>>;
    async fn add_cart_line(&self, line: NewCartLine) -> Result<CartLine>;
    async fn update_cart_line(
        &self,
        line_id: i64,
        quantity: i32,
        size: Option<String>,
    ) -> Result<CartLine>;
    async fn remove_cart_line(&self, line_id: i64) -> Result<()>;
    /// Atomically decrement stock for every line, mark lines ordered and
    /// fold the order total into the registration's amounts. Any line
    /// exceeding current stock aborts the whole transaction.
    async fn checkout(&self, registration_id: i64) -> Result<CheckoutOutcome>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn count(&self) -> Result<i64>;
}
