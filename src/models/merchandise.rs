//! Merchandise item and cart-line models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MerchandiseItem {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    /// None means unlimited stock
    pub stock: Option<i32>,
    pub sizes: Json<Vec<String>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartLine {
    pub id: i64,
    pub registration_id: i64,
    pub item_id: i64,
    pub quantity: i32,
    pub size: Option<String>,
    /// Item price captured when the line was added
    pub unit_price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMerchandiseItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: Option<i32>,
    pub sizes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMerchandiseItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i32>,
    pub sizes: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewCartLine {
    pub registration_id: i64,
    pub item_id: i64,
    pub quantity: i32,
    pub size: Option<String>,
    pub unit_price: f64,
}

/// Result of a successful checkout
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub ordered_lines: Vec<CartLine>,
    pub order_total: f64,
    pub registration_total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartLineStatus {
    InCart,
    Ordered,
}

impl CartLineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartLineStatus::InCart => "in_cart",
            CartLineStatus::Ordered => "ordered",
        }
    }
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}
