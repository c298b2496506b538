//! Shared test infrastructure
//!
//! In-memory store implementations substituted through the trait seams,
//! notifier fakes, and a router builder for endpoint tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use alumnet::api::AppState;
use alumnet::config::Settings;
use alumnet::database::store::{
    EventStore, MerchandiseStore, RegistrationDetail, RegistrationStore, RegistrationTotals,
    StatusCount, UserStore,
};
use alumnet::middleware::auth::issue_token;
use alumnet::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use alumnet::models::event::{
    CreateEventRequest, Event, FormField, NewFormField, UpdateEventRequest,
};
use alumnet::models::merchandise::{
    CartLine, CheckoutOutcome, CreateMerchandiseItemRequest, MerchandiseItem, NewCartLine,
    UpdateMerchandiseItemRequest,
};
use alumnet::models::registration::{
    FormResponse, Guest, NewGuest, NewRegistration, Registration, RegistrationChanges,
    SubmittedResponse,
};
use alumnet::models::user::{User, UserRole};
use alumnet::services::cache::NoopCache;
use alumnet::services::notification::{NotificationService, Notifier, OutboundEmail};
use alumnet::services::ServiceFactory;
use alumnet::utils::errors::{AlumnetError, Result};

pub const JWT_SECRET: &str = "test-secret-test-secret-test-secret!";

#[derive(Default)]
struct Inner {
    next_id: i64,
    events: HashMap<i64, Event>,
    form_fields: HashMap<i64, FormField>,
    users: HashMap<i64, User>,
    registrations: HashMap<i64, Registration>,
    guests: HashMap<i64, Guest>,
    responses: Vec<FormResponse>,
    items: HashMap<i64, MerchandiseItem>,
    cart_lines: HashMap<i64, CartLine>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// One coherent in-memory database implementing every store trait
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_user(&self, email: &str, full_name: &str, role: UserRole) -> User {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let user = User {
            id,
            email: email.to_string(),
            full_name: full_name.to_string(),
            graduation_year: Some(2010),
            role: role.as_str().to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());
        user
    }

    pub fn seed_event(&self, build: impl FnOnce(&mut Event)) -> Event {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let now = Utc::now();
        let mut event = Event {
            id,
            title: "Alumni Reunion".to_string(),
            slug: format!("alumni-reunion-{}", id),
            description: None,
            event_date: now + Duration::days(30),
            end_date: None,
            location: Some("Main Hall".to_string()),
            registration_start_date: Some(now - Duration::days(10)),
            registration_end_date: Some(now + Duration::days(20)),
            max_capacity: None,
            registration_fee: 0.0,
            guest_fee: 0.0,
            max_guests_per_registration: 0,
            external_link: None,
            has_registration: true,
            has_guests: false,
            has_meals: false,
            has_merchandise: false,
            has_donations: false,
            has_custom_form: false,
            allow_form_modification: true,
            form_modification_deadline_hours: 24,
            status: "registration_open".to_string(),
            created_by: 1,
            created_at: now,
            updated_at: now,
        };
        build(&mut event);
        inner.events.insert(id, event.clone());
        event
    }

    pub fn seed_form_field(&self, event_id: i64, label: &str, required: bool) -> FormField {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let field = FormField {
            id,
            event_id,
            label: label.to_string(),
            field_type: "text".to_string(),
            required,
            options: sqlx::types::Json(Vec::new()),
            position: inner.form_fields.len() as i32,
        };
        inner.form_fields.insert(id, field.clone());
        if let Some(event) = inner.events.get_mut(&event_id) {
            event.has_custom_form = true;
        }
        field
    }

    pub fn seed_item(&self, event_id: i64, build: impl FnOnce(&mut MerchandiseItem)) -> MerchandiseItem {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let now = Utc::now();
        let mut item = MerchandiseItem {
            id,
            event_id,
            name: "Alumni Hoodie".to_string(),
            description: None,
            price: 40.0,
            stock: Some(10),
            sizes: sqlx::types::Json(Vec::new()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        build(&mut item);
        inner.items.insert(id, item.clone());
        item
    }

    pub fn registration(&self, id: i64) -> Option<Registration> {
        self.inner.lock().unwrap().registrations.get(&id).cloned()
    }

    pub fn item(&self, id: i64) -> Option<MerchandiseItem> {
        self.inner.lock().unwrap().items.get(&id).cloned()
    }

    pub fn cart_line(&self, id: i64) -> Option<CartLine> {
        self.inner.lock().unwrap().cart_lines.get(&id).cloned()
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn create(
        &self,
        slug: String,
        created_by: i64,
        request: CreateEventRequest,
    ) -> Result<Event> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let now = Utc::now();
        let event = Event {
            id,
            title: request.title,
            slug,
            description: request.description,
            event_date: request.event_date,
            end_date: request.end_date,
            location: request.location,
            registration_start_date: request.registration_start_date,
            registration_end_date: request.registration_end_date,
            max_capacity: request.max_capacity,
            registration_fee: request.registration_fee.unwrap_or(0.0),
            guest_fee: request.guest_fee.unwrap_or(0.0),
            max_guests_per_registration: request.max_guests_per_registration.unwrap_or(0),
            external_link: request.external_link,
            has_registration: request.registration_start_date.is_some(),
            has_guests: request.has_guests.unwrap_or(false),
            has_meals: request.has_meals.unwrap_or(false),
            has_merchandise: request.has_merchandise.unwrap_or(false),
            has_donations: request.has_donations.unwrap_or(false),
            has_custom_form: false,
            allow_form_modification: request.allow_form_modification.unwrap_or(false),
            form_modification_deadline_hours: request
                .form_modification_deadline_hours
                .unwrap_or(24),
            status: "draft".to_string(),
            created_by,
            created_at: now,
            updated_at: now,
        };
        inner.events.insert(id, event.clone());
        Ok(event)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>> {
        Ok(self.inner.lock().unwrap().events.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .events
            .values()
            .find(|event| event.slug == slug)
            .cloned())
    }

    async fn list_visible(&self, limit: i64, offset: i64) -> Result<Vec<Event>> {
        let inner = self.inner.lock().unwrap();
        let mut events: Vec<Event> = inner
            .events
            .values()
            .filter(|event| !matches!(event.status.as_str(), "draft" | "archived"))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.event_date);
        Ok(events
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update(&self, id: i64, request: UpdateEventRequest) -> Result<Event> {
        let mut inner = self.inner.lock().unwrap();
        let event = inner
            .events
            .get_mut(&id)
            .ok_or(AlumnetError::EventNotFound { event_id: id })?;

        if let Some(title) = request.title {
            event.title = title;
        }
        if let Some(description) = request.description {
            event.description = Some(description);
        }
        if let Some(event_date) = request.event_date {
            event.event_date = event_date;
        }
        if let Some(end_date) = request.end_date {
            event.end_date = Some(end_date);
        }
        if let Some(location) = request.location {
            event.location = Some(location);
        }
        if let Some(start) = request.registration_start_date {
            event.registration_start_date = Some(start);
        }
        if let Some(end) = request.registration_end_date {
            event.registration_end_date = Some(end);
        }
        if let Some(capacity) = request.max_capacity {
            event.max_capacity = Some(capacity);
        }
        if let Some(fee) = request.registration_fee {
            event.registration_fee = fee;
        }
        if let Some(fee) = request.guest_fee {
            event.guest_fee = fee;
        }
        if let Some(max) = request.max_guests_per_registration {
            event.max_guests_per_registration = max;
        }
        if let Some(link) = request.external_link {
            event.external_link = Some(link);
        }
        if let Some(flag) = request.has_guests {
            event.has_guests = flag;
        }
        if let Some(flag) = request.has_meals {
            event.has_meals = flag;
        }
        if let Some(flag) = request.has_merchandise {
            event.has_merchandise = flag;
        }
        if let Some(flag) = request.has_donations {
            event.has_donations = flag;
        }
        if let Some(flag) = request.allow_form_modification {
            event.allow_form_modification = flag;
        }
        if let Some(hours) = request.form_modification_deadline_hours {
            event.form_modification_deadline_hours = hours;
        }
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn set_status(&self, id: i64, status: &str) -> Result<Event> {
        let mut inner = self.inner.lock().unwrap();
        let event = inner
            .events
            .get_mut(&id)
            .ok_or(AlumnetError::EventNotFound { event_id: id })?;
        event.status = status.to_string();
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.remove(&id);
        inner.form_fields.retain(|_, field| field.event_id != id);
        Ok(())
    }

    async fn registration_count(&self, event_id: i64) -> Result<i64> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .registrations
            .values()
            .filter(|registration| registration.event_id == event_id)
            .count() as i64)
    }

    async fn confirmed_count(&self, event_id: i64) -> Result<i64> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .registrations
            .values()
            .filter(|registration| {
                registration.event_id == event_id && registration.status == "confirmed"
            })
            .count() as i64)
    }

    async fn form_fields(&self, event_id: i64) -> Result<Vec<FormField>> {
        let inner = self.inner.lock().unwrap();
        let mut fields: Vec<FormField> = inner
            .form_fields
            .values()
            .filter(|field| field.event_id == event_id)
            .cloned()
            .collect();
        fields.sort_by_key(|field| field.position);
        Ok(fields)
    }

    async fn replace_form_fields(
        &self,
        event_id: i64,
        fields: Vec<NewFormField>,
    ) -> Result<Vec<FormField>> {
        let mut inner = self.inner.lock().unwrap();
        inner.form_fields.retain(|_, field| field.event_id != event_id);

        let mut created = Vec::with_capacity(fields.len());
        for (position, field) in fields.into_iter().enumerate() {
            let id = inner.next_id();
            let row = FormField {
                id,
                event_id,
                label: field.label,
                field_type: field.field_type,
                required: field.required,
                options: sqlx::types::Json(field.options),
                position: position as i32,
            };
            inner.form_fields.insert(id, row.clone());
            created.push(row);
        }

        if let Some(event) = inner.events.get_mut(&event_id) {
            event.has_custom_form = !created.is_empty();
        }
        Ok(created)
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>> {
        let inner = self.inner.lock().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for event in inner.events.values() {
            *counts.entry(event.status.clone()).or_insert(0) += 1;
        }
        let mut result: Vec<StatusCount> = counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect();
        result.sort_by(|a, b| a.status.cmp(&b.status));
        Ok(result)
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Registration>> {
        Ok(self.inner.lock().unwrap().registrations.get(&id).cloned())
    }

    async fn find_by_event_and_user(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Registration>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .registrations
            .values()
            .find(|registration| {
                registration.event_id == event_id && registration.user_id == user_id
            })
            .cloned())
    }

    async fn create_with_responses(
        &self,
        registration: NewRegistration,
        responses: Vec<SubmittedResponse>,
    ) -> Result<Registration> {
        let mut inner = self.inner.lock().unwrap();

        // mirrors the unique (event_id, user_id) constraint
        if inner.registrations.values().any(|existing| {
            existing.event_id == registration.event_id && existing.user_id == registration.user_id
        }) {
            return Err(AlumnetError::DuplicateRegistration {
                event_id: registration.event_id,
            });
        }

        let id = inner.next_id();
        let now = Utc::now();
        let created = Registration {
            id,
            event_id: registration.event_id,
            user_id: registration.user_id,
            status: "confirmed".to_string(),
            payment_status: registration.payment_status,
            meal_preference: registration.meal_preference,
            registration_fee_paid: registration.registration_fee_paid,
            guest_fees_paid: 0.0,
            merchandise_total: 0.0,
            donation_amount: registration.donation_amount,
            total_amount: registration.total_amount,
            modification_count: 0,
            registered_at: now,
            updated_at: now,
        };
        inner.registrations.insert(id, created.clone());

        for response in responses {
            let response_id = inner.next_id();
            inner.responses.push(FormResponse {
                id: response_id,
                registration_id: id,
                field_id: response.field_id,
                response: response.response,
            });
        }
        Ok(created)
    }

    async fn update(&self, id: i64, changes: RegistrationChanges) -> Result<Registration> {
        let mut inner = self.inner.lock().unwrap();
        let registration = inner
            .registrations
            .get_mut(&id)
            .ok_or(AlumnetError::RegistrationMissing { registration_id: id })?;

        if let Some(preference) = changes.meal_preference {
            registration.meal_preference = Some(preference);
        }
        if let Some(donation) = changes.donation_amount {
            registration.donation_amount = donation;
        }
        if let Some(guest_fees) = changes.guest_fees_paid {
            registration.guest_fees_paid = guest_fees;
        }
        if let Some(total) = changes.total_amount {
            registration.total_amount = total;
        }
        registration.modification_count += 1;
        registration.updated_at = Utc::now();
        Ok(registration.clone())
    }

    async fn replace_responses(&self, id: i64, responses: Vec<SubmittedResponse>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.retain(|response| response.registration_id != id);
        for response in responses {
            let response_id = inner.next_id();
            inner.responses.push(FormResponse {
                id: response_id,
                registration_id: id,
                field_id: response.field_id,
                response: response.response,
            });
        }
        Ok(())
    }

    async fn cancel(&self, id: i64) -> Result<Registration> {
        let mut inner = self.inner.lock().unwrap();
        let registration = inner
            .registrations
            .get_mut(&id)
            .ok_or(AlumnetError::RegistrationMissing { registration_id: id })?;
        registration.status = "cancelled".to_string();
        registration.updated_at = Utc::now();
        let cancelled = registration.clone();

        for guest in inner.guests.values_mut() {
            if guest.registration_id == id {
                guest.status = "cancelled".to_string();
            }
        }
        Ok(cancelled)
    }

    async fn add_guest(&self, registration_id: i64, guest: NewGuest) -> Result<Guest> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let created = Guest {
            id,
            registration_id,
            name: guest.name,
            meal_preference: guest.meal_preference,
            status: "active".to_string(),
            created_at: Utc::now(),
        };
        inner.guests.insert(id, created.clone());
        Ok(created)
    }

    async fn find_guest(&self, guest_id: i64) -> Result<Option<Guest>> {
        Ok(self.inner.lock().unwrap().guests.get(&guest_id).cloned())
    }

    async fn cancel_guest(&self, guest_id: i64) -> Result<Guest> {
        let mut inner = self.inner.lock().unwrap();
        let guest = inner
            .guests
            .get_mut(&guest_id)
            .ok_or(AlumnetError::GuestNotFound { guest_id })?;
        guest.status = "cancelled".to_string();
        Ok(guest.clone())
    }

    async fn active_guests(&self, registration_id: i64) -> Result<Vec<Guest>> {
        let inner = self.inner.lock().unwrap();
        let mut guests: Vec<Guest> = inner
            .guests
            .values()
            .filter(|guest| guest.registration_id == registration_id && guest.status == "active")
            .cloned()
            .collect();
        guests.sort_by_key(|guest| guest.id);
        Ok(guests)
    }

    async fn responses(&self, registration_id: i64) -> Result<Vec<FormResponse>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .responses
            .iter()
            .filter(|response| response.registration_id == registration_id)
            .cloned()
            .collect())
    }

    async fn set_payment_status(&self, id: i64, payment_status: &str) -> Result<Registration> {
        let mut inner = self.inner.lock().unwrap();
        let registration = inner
            .registrations
            .get_mut(&id)
            .ok_or(AlumnetError::RegistrationMissing { registration_id: id })?;
        registration.payment_status = payment_status.to_string();
        registration.updated_at = Utc::now();
        Ok(registration.clone())
    }

    async fn list_for_event(&self, event_id: i64) -> Result<Vec<RegistrationDetail>> {
        let inner = self.inner.lock().unwrap();
        let mut details: Vec<RegistrationDetail> = inner
            .registrations
            .values()
            .filter(|registration| registration.event_id == event_id)
            .map(|registration| {
                let user = inner.users.get(&registration.user_id);
                let guest_count = inner
                    .guests
                    .values()
                    .filter(|guest| {
                        guest.registration_id == registration.id && guest.status == "active"
                    })
                    .count() as i64;
                RegistrationDetail {
                    registration: registration.clone(),
                    user_email: user.map(|u| u.email.clone()).unwrap_or_default(),
                    user_full_name: user.map(|u| u.full_name.clone()).unwrap_or_default(),
                    guest_count,
                }
            })
            .collect();
        details.sort_by_key(|detail| detail.registration.registered_at);
        Ok(details)
    }

    async fn totals(&self) -> Result<RegistrationTotals> {
        let inner = self.inner.lock().unwrap();
        let mut totals = RegistrationTotals::default();
        for registration in inner.registrations.values() {
            totals.total += 1;
            match registration.status.as_str() {
                "confirmed" => {
                    totals.confirmed += 1;
                    totals.revenue += registration.total_amount;
                }
                "cancelled" => totals.cancelled += 1,
                _ => {}
            }
        }
        Ok(totals)
    }
}

#[async_trait]
impl MerchandiseStore for InMemoryStore {
    async fn list_items(&self, event_id: i64, only_active: bool) -> Result<Vec<MerchandiseItem>> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<MerchandiseItem> = inner
            .items
            .values()
            .filter(|item| item.event_id == event_id && (!only_active || item.is_active))
            .cloned()
            .collect();
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    async fn find_item(&self, item_id: i64) -> Result<Option<MerchandiseItem>> {
        Ok(self.inner.lock().unwrap().items.get(&item_id).cloned())
    }

    async fn create_item(
        &self,
        event_id: i64,
        request: CreateMerchandiseItemRequest,
    ) -> Result<MerchandiseItem> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let now = Utc::now();
        let item = MerchandiseItem {
            id,
            event_id,
            name: request.name,
            description: request.description,
            price: request.price,
            stock: request.stock,
            sizes: sqlx::types::Json(request.sizes.unwrap_or_default()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.items.insert(id, item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        item_id: i64,
        request: UpdateMerchandiseItemRequest,
    ) -> Result<MerchandiseItem> {
        let mut inner = self.inner.lock().unwrap();
        let item = inner
            .items
            .get_mut(&item_id)
            .ok_or(AlumnetError::MerchandiseItemNotFound { item_id })?;

        if let Some(name) = request.name {
            item.name = name;
        }
        if let Some(description) = request.description {
            item.description = Some(description);
        }
        if let Some(price) = request.price {
            item.price = price;
        }
        if let Some(stock) = request.stock {
            item.stock = Some(stock);
        }
        if let Some(sizes) = request.sizes {
            item.sizes = sqlx::types::Json(sizes);
        }
        if let Some(active) = request.is_active {
            item.is_active = active;
        }
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn cart(&self, registration_id: i64) -> Result<Vec<CartLine>> {
        let inner = self.inner.lock().unwrap();
        let mut lines: Vec<CartLine> = inner
            .cart_lines
            .values()
            .filter(|line| line.registration_id == registration_id && line.status == "in_cart")
            .cloned()
            .collect();
        lines.sort_by_key(|line| line.id);
        Ok(lines)
    }

    async fn find_cart_line(&self, line_id: i64) -> Result<Option<CartLine>> {
        Ok(self.inner.lock().unwrap().cart_lines.get(&line_id).cloned())
    }

    async fn add_cart_line(&self, line: NewCartLine) -> Result<CartLine> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let created = CartLine {
            id,
            registration_id: line.registration_id,
            item_id: line.item_id,
            quantity: line.quantity,
            size: line.size,
            unit_price: line.unit_price,
            status: "in_cart".to_string(),
            created_at: Utc::now(),
        };
        inner.cart_lines.insert(id, created.clone());
        Ok(created)
    }

    async fn update_cart_line(
        &self,
        line_id: i64,
        quantity: i32,
        size: Option<String>,
    ) -> Result<CartLine> {
        let mut inner = self.inner.lock().unwrap();
        let line = inner
            .cart_lines
            .get_mut(&line_id)
            .ok_or(AlumnetError::CartLineNotFound { line_id })?;
        line.quantity = quantity;
        if let Some(size) = size {
            line.size = Some(size);
        }
        Ok(line.clone())
    }

    async fn remove_cart_line(&self, line_id: i64) -> Result<()> {
        self.inner.lock().unwrap().cart_lines.remove(&line_id);
        Ok(())
    }

    async fn checkout(&self, registration_id: i64) -> Result<CheckoutOutcome> {
        let mut inner = self.inner.lock().unwrap();

        let mut lines: Vec<CartLine> = inner
            .cart_lines
            .values()
            .filter(|line| line.registration_id == registration_id && line.status == "in_cart")
            .cloned()
            .collect();
        lines.sort_by_key(|line| line.id);

        if lines.is_empty() {
            return Err(AlumnetError::InvalidInput("Cart is empty".to_string()));
        }

        // all-or-nothing: verify every line before touching any stock
        for line in &lines {
            let item = inner
                .items
                .get(&line.item_id)
                .ok_or(AlumnetError::MerchandiseItemNotFound { item_id: line.item_id })?;
            if let Some(stock) = item.stock {
                if line.quantity > stock {
                    return Err(AlumnetError::InsufficientStock {
                        item_name: item.name.clone(),
                        requested: line.quantity,
                        available: stock,
                    });
                }
            }
        }

        let mut order_total = 0.0;
        for line in &mut lines {
            if let Some(item) = inner.items.get_mut(&line.item_id) {
                if let Some(stock) = item.stock {
                    item.stock = Some(stock - line.quantity);
                }
            }
            order_total += line.unit_price * line.quantity as f64;
            line.status = "ordered".to_string();
            inner.cart_lines.insert(line.id, line.clone());
        }

        let registration = inner
            .registrations
            .get_mut(&registration_id)
            .ok_or(AlumnetError::RegistrationMissing { registration_id })?;
        registration.merchandise_total += order_total;
        registration.total_amount += order_total;
        registration.updated_at = Utc::now();
        let registration_total = registration.total_amount;

        Ok(CheckoutOutcome {
            ordered_lines: lines,
            order_total,
            registration_total,
        })
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.inner.lock().unwrap().users.len() as i64)
    }
}

/// Notifier that records every email it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingNotifier {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Notifier that always fails, for the best-effort delivery tests
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _email: OutboundEmail) -> Result<()> {
        Err(AlumnetError::ServiceUnavailable("smtp down".to_string()))
    }
}

/// Everything a test needs: the store, services wired through it, the
/// recorded outbox and the HTTP state.
pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub services: ServiceFactory,
    pub emails: Arc<RecordingNotifier>,
    pub settings: Arc<Settings>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_notifier_inner(None)
    }

    pub fn with_failing_notifier() -> Self {
        Self::with_notifier_inner(Some(Arc::new(FailingNotifier)))
    }

    fn with_notifier_inner(notifier: Option<Arc<dyn Notifier>>) -> Self {
        let store = InMemoryStore::new();
        let emails = Arc::new(RecordingNotifier::default());
        let notifier: Arc<dyn Notifier> = notifier.unwrap_or_else(|| emails.clone());
        let notifications = Arc::new(NotificationService::new(notifier, true));

        let services = ServiceFactory::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            notifications,
        );

        let mut settings = Settings::default();
        settings.auth.jwt_secret = JWT_SECRET.to_string();

        Self {
            store,
            services,
            emails,
            settings: Arc::new(settings),
        }
    }

    /// Build the full router over the in-memory stores
    pub fn app(&self) -> axum::Router {
        self.app_with_rate_limit(100)
    }

    pub fn app_with_rate_limit(&self, max_requests: u32) -> axum::Router {
        alumnet::api::router(AppState {
            services: self.services.clone(),
            cache: Arc::new(NoopCache),
            settings: self.settings.clone(),
            rate_limiter: RateLimiter::new(RateLimitConfig {
                max_requests,
                window_duration: std::time::Duration::from_secs(60),
            }),
        })
    }

    pub fn token_for(&self, user: &User) -> String {
        let role = UserRole::parse(&user.role).expect("seeded role is valid");
        issue_token(user.id, &user.email, role, &self.settings.auth, 3600).expect("token issuance")
    }
}

/// Give spawned best-effort tasks (emails, evictions) a chance to run
pub async fn drain_background_tasks() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}

/// Convenience for dates relative to now
pub fn days_from_now(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}

pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}
