//! Merchandise service implementation
//!
//! Cart and checkout rules on top of the merchandise store: feature and
//! registration gating, size/quantity validation, price capture at
//! add-time, and the atomic checkout.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::database::store::{EventStore, MerchandiseStore, RegistrationStore};
use crate::models::event::Event;
use crate::models::merchandise::{
    CartLine, CheckoutOutcome, CreateMerchandiseItemRequest, MerchandiseItem, NewCartLine,
    UpdateMerchandiseItemRequest,
};
use crate::models::registration::Registration;
use crate::utils::errors::{AlumnetError, Result};

/// Member request to add a cart line
#[derive(Debug, Clone, Deserialize)]
pub struct AddCartLineRequest {
    pub item_id: i64,
    pub quantity: i32,
    pub size: Option<String>,
}

/// Member request to change a cart line
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartLineRequest {
    pub quantity: i32,
    pub size: Option<String>,
}

#[derive(Clone)]
pub struct MerchandiseService {
    events: Arc<dyn EventStore>,
    registrations: Arc<dyn RegistrationStore>,
    merchandise: Arc<dyn MerchandiseStore>,
}

impl MerchandiseService {
    pub fn new(
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        merchandise: Arc<dyn MerchandiseStore>,
    ) -> Self {
        Self {
            events,
            registrations,
            merchandise,
        }
    }

    /// Active items for a member-visible event
    pub async fn list_items(&self, event_id: i64) -> Result<Vec<MerchandiseItem>> {
        self.merchandise_event(event_id).await?;
        self.merchandise.list_items(event_id, true).await
    }

    /// Admin item creation
    pub async fn create_item(
        &self,
        event_id: i64,
        request: CreateMerchandiseItemRequest,
    ) -> Result<MerchandiseItem> {
        if request.name.trim().is_empty() {
            return Err(AlumnetError::InvalidInput(
                "Item name is required".to_string(),
            ));
        }
        if request.price < 0.0 {
            return Err(AlumnetError::InvalidInput(
                "Item price cannot be negative".to_string(),
            ));
        }
        if request.stock.is_some_and(|stock| stock < 0) {
            return Err(AlumnetError::InvalidInput(
                "Item stock cannot be negative".to_string(),
            ));
        }

        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(AlumnetError::EventNotFound { event_id })?;

        self.merchandise.create_item(event_id, request).await
    }

    /// Admin item update
    pub async fn update_item(
        &self,
        item_id: i64,
        request: UpdateMerchandiseItemRequest,
    ) -> Result<MerchandiseItem> {
        if request.price.is_some_and(|price| price < 0.0) {
            return Err(AlumnetError::InvalidInput(
                "Item price cannot be negative".to_string(),
            ));
        }

        self.merchandise
            .find_item(item_id)
            .await?
            .ok_or(AlumnetError::MerchandiseItemNotFound { item_id })?;

        self.merchandise.update_item(item_id, request).await
    }

    /// The caller's open cart for an event
    pub async fn cart(&self, event_id: i64, user_id: i64) -> Result<Vec<CartLine>> {
        let (_, registration) = self.confirmed_registration(event_id, user_id).await?;
        self.merchandise.cart(registration.id).await
    }

    /// Add a line to the caller's cart, capturing the current item price
    pub async fn add_to_cart(
        &self,
        event_id: i64,
        user_id: i64,
        request: AddCartLineRequest,
    ) -> Result<CartLine> {
        let (_, registration) = self.confirmed_registration(event_id, user_id).await?;

        if request.quantity < 1 {
            return Err(AlumnetError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let item = self
            .merchandise
            .find_item(request.item_id)
            .await?
            .filter(|item| item.event_id == event_id)
            .ok_or(AlumnetError::MerchandiseItemNotFound {
                item_id: request.item_id,
            })?;

        if !item.is_active {
            return Err(AlumnetError::InvalidInput(format!(
                "{} is no longer available",
                item.name
            )));
        }

        let size = validate_size(&item, request.size)?;

        if let Some(stock) = item.stock {
            if request.quantity > stock {
                return Err(AlumnetError::InsufficientStock {
                    item_name: item.name.clone(),
                    requested: request.quantity,
                    available: stock,
                });
            }
        }

        let line = self
            .merchandise
            .add_cart_line(NewCartLine {
                registration_id: registration.id,
                item_id: item.id,
                quantity: request.quantity,
                size,
                unit_price: item.price,
            })
            .await?;

        debug!(event_id = event_id, user_id = user_id, item_id = item.id, "Cart line added");
        Ok(line)
    }

    /// Change quantity or size of one of the caller's cart lines
    pub async fn update_cart_line(
        &self,
        event_id: i64,
        user_id: i64,
        line_id: i64,
        request: UpdateCartLineRequest,
    ) -> Result<CartLine> {
        let (_, registration) = self.confirmed_registration(event_id, user_id).await?;

        if request.quantity < 1 {
            return Err(AlumnetError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let line = self.owned_cart_line(&registration, line_id).await?;

        let item = self
            .merchandise
            .find_item(line.item_id)
            .await?
            .ok_or(AlumnetError::MerchandiseItemNotFound { item_id: line.item_id })?;
        let size = match request.size {
            Some(size) => validate_size(&item, Some(size))?,
            None => None,
        };

        self.merchandise
            .update_cart_line(line_id, request.quantity, size)
            .await
    }

    /// Remove one of the caller's cart lines
    pub async fn remove_cart_line(&self, event_id: i64, user_id: i64, line_id: i64) -> Result<()> {
        let (_, registration) = self.confirmed_registration(event_id, user_id).await?;
        self.owned_cart_line(&registration, line_id).await?;
        self.merchandise.remove_cart_line(line_id).await
    }

    /// Check out the caller's cart: stock decrement, order marking and
    /// registration totals in one transaction
    pub async fn checkout(&self, event_id: i64, user_id: i64) -> Result<CheckoutOutcome> {
        let (_, registration) = self.confirmed_registration(event_id, user_id).await?;

        let outcome = self.merchandise.checkout(registration.id).await?;
        info!(
            event_id = event_id,
            user_id = user_id,
            order_total = outcome.order_total,
            lines = outcome.ordered_lines.len(),
            "Checkout completed"
        );

        Ok(outcome)
    }

    /// Load an event that is visible and has the merchandise feature
    async fn merchandise_event(&self, event_id: i64) -> Result<Event> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(AlumnetError::EventNotFound { event_id })?;

        match event.status() {
            Some(status) if status.is_visible() => {}
            _ => return Err(AlumnetError::EventNotFound { event_id }),
        }

        if !event.has_merchandise {
            return Err(AlumnetError::InvalidInput(
                "This event does not offer merchandise".to_string(),
            ));
        }

        Ok(event)
    }

    /// Cart operations require a confirmed registration
    async fn confirmed_registration(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<(Event, Registration)> {
        let event = self.merchandise_event(event_id).await?;

        let registration = self
            .registrations
            .find_by_event_and_user(event_id, user_id)
            .await?
            .ok_or(AlumnetError::RegistrationNotFound { event_id })?;

        if !registration.is_confirmed() {
            return Err(AlumnetError::InvalidInput(
                "Merchandise orders require a confirmed registration".to_string(),
            ));
        }

        Ok((event, registration))
    }

    async fn owned_cart_line(&self, registration: &Registration, line_id: i64) -> Result<CartLine> {
        self.merchandise
            .find_cart_line(line_id)
            .await?
            .filter(|line| line.registration_id == registration.id && line.status == "in_cart")
            .ok_or(AlumnetError::CartLineNotFound { line_id })
    }
}

fn validate_size(item: &MerchandiseItem, size: Option<String>) -> Result<Option<String>> {
    let sizes = &item.sizes.0;
    match size {
        Some(size) if sizes.iter().any(|s| s == &size) => Ok(Some(size)),
        Some(size) => Err(AlumnetError::InvalidInput(format!(
            "Size {} is not available for {}. Available sizes: {:?}",
            size, item.name, sizes
        ))),
        None if sizes.is_empty() => Ok(None),
        None => Err(AlumnetError::InvalidInput(format!(
            "A size is required for {}. Available sizes: {:?}",
            item.name, sizes
        ))),
    }
}
