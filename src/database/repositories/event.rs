//! Event repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::database::store::{EventStore, StatusCount};
use crate::models::event::{
    CreateEventRequest, Event, EventStatus, FormField, NewFormField, UpdateEventRequest,
};
use crate::utils::errors::Result;

const EVENT_COLUMNS: &str = "id, title, slug, description, event_date, end_date, location, \
     registration_start_date, registration_end_date, max_capacity, registration_fee, guest_fee, \
     max_guests_per_registration, external_link, has_registration, has_guests, has_meals, \
     has_merchandise, has_donations, has_custom_form, allow_form_modification, \
     form_modification_deadline_hours, status, created_by, created_at, updated_at";

const FORM_FIELD_COLUMNS: &str = "id, event_id, label, field_type, required, options, position";

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    /// Create a new event in the draft state
    async fn create(
        &self,
        slug: String,
        created_by: i64,
        request: CreateEventRequest,
    ) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (title, slug, description, event_date, end_date, location,
                registration_start_date, registration_end_date, max_capacity, registration_fee,
                guest_fee, max_guests_per_registration, external_link, has_registration,
                has_guests, has_meals, has_merchandise, has_donations, has_custom_form,
                allow_form_modification, form_modification_deadline_hours, status, created_by,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23, $24, $25)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(request.title)
        .bind(slug)
        .bind(request.description)
        .bind(request.event_date)
        .bind(request.end_date)
        .bind(request.location)
        .bind(request.registration_start_date)
        .bind(request.registration_end_date)
        .bind(request.max_capacity)
        .bind(request.registration_fee.unwrap_or(0.0))
        .bind(request.guest_fee.unwrap_or(0.0))
        .bind(request.max_guests_per_registration.unwrap_or(0))
        .bind(request.external_link)
        .bind(request.registration_start_date.is_some())
        .bind(request.has_guests.unwrap_or(false))
        .bind(request.has_meals.unwrap_or(false))
        .bind(request.has_merchandise.unwrap_or(false))
        .bind(request.has_donations.unwrap_or(false))
        .bind(false)
        .bind(request.allow_form_modification.unwrap_or(false))
        .bind(request.form_modification_deadline_hours.unwrap_or(24))
        .bind(EventStatus::Draft.as_str())
        .bind(created_by)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE slug = $1",
            EVENT_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn list_visible(&self, limit: i64, offset: i64) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE status NOT IN ('draft', 'archived') \
             ORDER BY event_date ASC LIMIT $1 OFFSET $2",
            EVENT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn update(&self, id: i64, request: UpdateEventRequest) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                event_date = COALESCE($4, event_date),
                end_date = COALESCE($5, end_date),
                location = COALESCE($6, location),
                registration_start_date = COALESCE($7, registration_start_date),
                registration_end_date = COALESCE($8, registration_end_date),
                max_capacity = COALESCE($9, max_capacity),
                registration_fee = COALESCE($10, registration_fee),
                guest_fee = COALESCE($11, guest_fee),
                max_guests_per_registration = COALESCE($12, max_guests_per_registration),
                external_link = COALESCE($13, external_link),
                has_guests = COALESCE($14, has_guests),
                has_meals = COALESCE($15, has_meals),
                has_merchandise = COALESCE($16, has_merchandise),
                has_donations = COALESCE($17, has_donations),
                allow_form_modification = COALESCE($18, allow_form_modification),
                form_modification_deadline_hours = COALESCE($19, form_modification_deadline_hours),
                updated_at = $20
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.event_date)
        .bind(request.end_date)
        .bind(request.location)
        .bind(request.registration_start_date)
        .bind(request.registration_end_date)
        .bind(request.max_capacity)
        .bind(request.registration_fee)
        .bind(request.guest_fee)
        .bind(request.max_guests_per_registration)
        .bind(request.external_link)
        .bind(request.has_guests)
        .bind(request.has_meals)
        .bind(request.has_merchandise)
        .bind(request.has_donations)
        .bind(request.allow_form_modification)
        .bind(request.form_modification_deadline_hours)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    async fn set_status(&self, id: i64, status: &str) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn registration_count(&self, event_id: i64) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    async fn confirmed_count(&self, event_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn form_fields(&self, event_id: i64) -> Result<Vec<FormField>> {
        let fields = sqlx::query_as::<_, FormField>(&format!(
            "SELECT {} FROM form_fields WHERE event_id = $1 ORDER BY position ASC",
            FORM_FIELD_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(fields)
    }

    /// Replace the event's form definition as one transaction
    async fn replace_form_fields(
        &self,
        event_id: i64,
        fields: Vec<NewFormField>,
    ) -> Result<Vec<FormField>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM form_fields WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(fields.len());
        for (position, field) in fields.into_iter().enumerate() {
            let row = sqlx::query_as::<_, FormField>(&format!(
                r#"
                INSERT INTO form_fields (event_id, label, field_type, required, options, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {}
                "#,
                FORM_FIELD_COLUMNS
            ))
            .bind(event_id)
            .bind(field.label)
            .bind(field.field_type)
            .bind(field.required)
            .bind(sqlx::types::Json(field.options))
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        sqlx::query("UPDATE events SET has_custom_form = $2, updated_at = $3 WHERE id = $1")
            .bind(event_id)
            .bind(!created.is_empty())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM events GROUP BY status ORDER BY status")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }
}
