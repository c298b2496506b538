//! Merchandise repository implementation
//!
//! Items, cart lines and the checkout transaction. Checkout is the one
//! concurrency-sensitive write: stock decrements are conditional updates
//! inside a single transaction, so any shortfall rolls the whole order back.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::database::store::MerchandiseStore;
use crate::models::merchandise::{
    CartLine, CartLineStatus, CheckoutOutcome, CreateMerchandiseItemRequest, MerchandiseItem,
    NewCartLine, UpdateMerchandiseItemRequest,
};
use crate::utils::errors::{AlumnetError, Result};

const ITEM_COLUMNS: &str =
    "id, event_id, name, description, price, stock, sizes, is_active, created_at, updated_at";

const LINE_COLUMNS: &str =
    "id, registration_id, item_id, quantity, size, unit_price, status, created_at";

#[derive(Clone)]
pub struct MerchandiseRepository {
    pool: PgPool,
}

impl MerchandiseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MerchandiseStore for MerchandiseRepository {
    async fn list_items(&self, event_id: i64, only_active: bool) -> Result<Vec<MerchandiseItem>> {
        let query = if only_active {
            format!(
                "SELECT {} FROM merchandise_items WHERE event_id = $1 AND is_active = true ORDER BY id ASC",
                ITEM_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM merchandise_items WHERE event_id = $1 ORDER BY id ASC",
                ITEM_COLUMNS
            )
        };

        let items = sqlx::query_as::<_, MerchandiseItem>(&query)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    async fn find_item(&self, item_id: i64) -> Result<Option<MerchandiseItem>> {
        let item = sqlx::query_as::<_, MerchandiseItem>(&format!(
            "SELECT {} FROM merchandise_items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn create_item(
        &self,
        event_id: i64,
        request: CreateMerchandiseItemRequest,
    ) -> Result<MerchandiseItem> {
        let item = sqlx::query_as::<_, MerchandiseItem>(&format!(
            r#"
            INSERT INTO merchandise_items (event_id, name, description, price, stock, sizes,
                is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, true, $7, $7)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(event_id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.price)
        .bind(request.stock)
        .bind(sqlx::types::Json(request.sizes.unwrap_or_default()))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    async fn update_item(
        &self,
        item_id: i64,
        request: UpdateMerchandiseItemRequest,
    ) -> Result<MerchandiseItem> {
        let item = sqlx::query_as::<_, MerchandiseItem>(&format!(
            r#"
            UPDATE merchandise_items
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock),
                sizes = COALESCE($6, sizes),
                is_active = COALESCE($7, is_active),
                updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.price)
        .bind(request.stock)
        .bind(request.sizes.map(sqlx::types::Json))
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    async fn cart(&self, registration_id: i64) -> Result<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(&format!(
            "SELECT {} FROM cart_lines WHERE registration_id = $1 AND status = 'in_cart' ORDER BY id ASC",
            LINE_COLUMNS
        ))
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn find_cart_line(&self, line_id: i64) -> Result<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(&format!(
            "SELECT {} FROM cart_lines WHERE id = $1",
            LINE_COLUMNS
        ))
        .bind(line_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    async fn add_cart_line(&self, line: NewCartLine) -> Result<CartLine> {
        let created = sqlx::query_as::<_, CartLine>(&format!(
            r#"
            INSERT INTO cart_lines (registration_id, item_id, quantity, size, unit_price,
                status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            LINE_COLUMNS
        ))
        .bind(line.registration_id)
        .bind(line.item_id)
        .bind(line.quantity)
        .bind(line.size)
        .bind(line.unit_price)
        .bind(CartLineStatus::InCart.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_cart_line(
        &self,
        line_id: i64,
        quantity: i32,
        size: Option<String>,
    ) -> Result<CartLine> {
        let line = sqlx::query_as::<_, CartLine>(&format!(
            "UPDATE cart_lines SET quantity = $2, size = COALESCE($3, size) WHERE id = $1 RETURNING {}",
            LINE_COLUMNS
        ))
        .bind(line_id)
        .bind(quantity)
        .bind(size)
        .fetch_one(&self.pool)
        .await?;

        Ok(line)
    }

    async fn remove_cart_line(&self, line_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM cart_lines WHERE id = $1")
            .bind(line_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn checkout(&self, registration_id: i64) -> Result<CheckoutOutcome> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CartLine>(&format!(
            "SELECT {} FROM cart_lines WHERE registration_id = $1 AND status = 'in_cart' \
             ORDER BY id ASC FOR UPDATE",
            LINE_COLUMNS
        ))
        .bind(registration_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(AlumnetError::InvalidInput("Cart is empty".to_string()));
        }

        for line in &lines {
            let updated = sqlx::query(
                r#"
                UPDATE merchandise_items
                SET stock = CASE WHEN stock IS NULL THEN NULL ELSE stock - $2 END,
                    updated_at = $3
                WHERE id = $1 AND (stock IS NULL OR stock >= $2)
                "#,
            )
            .bind(line.item_id)
            .bind(line.quantity)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                // dropping the transaction rolls back earlier decrements
                let item: Option<(String, Option<i32>)> =
                    sqlx::query_as("SELECT name, stock FROM merchandise_items WHERE id = $1")
                        .bind(line.item_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                let (item_name, available) =
                    item.unwrap_or(("unknown item".to_string(), Some(0)));
                return Err(AlumnetError::InsufficientStock {
                    item_name,
                    requested: line.quantity,
                    available: available.unwrap_or(0),
                });
            }
        }

        sqlx::query(
            "UPDATE cart_lines SET status = $2 WHERE registration_id = $1 AND status = 'in_cart'",
        )
        .bind(registration_id)
        .bind(CartLineStatus::Ordered.as_str())
        .execute(&mut *tx)
        .await?;

        let order_total: f64 = lines.iter().map(CartLine::line_total).sum();

        let totals: (f64,) = sqlx::query_as(
            r#"
            UPDATE registrations
            SET merchandise_total = merchandise_total + $2,
                total_amount = total_amount + $2,
                updated_at = $3
            WHERE id = $1
            RETURNING total_amount
            "#,
        )
        .bind(registration_id)
        .bind(order_total)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let ordered_lines = lines
            .into_iter()
            .map(|mut line| {
                line.status = CartLineStatus::Ordered.as_str().to_string();
                line
            })
            .collect();

        Ok(CheckoutOutcome {
            ordered_lines,
            order_total,
            registration_total: totals.0,
        })
    }
}
