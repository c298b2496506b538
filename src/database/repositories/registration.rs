//! Registration repository implementation
//!
//! Registration rows, their guests and their form responses live here.
//! Multi-row writes (registration + responses, cancellation + guests) are
//! wrapped in a single transaction.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, PgPool};

use crate::database::store::{RegistrationDetail, RegistrationStore, RegistrationTotals};
use crate::models::registration::{
    FormResponse, Guest, NewGuest, NewRegistration, Registration, RegistrationChanges,
    RegistrationStatus, SubmittedResponse,
};
use crate::utils::errors::{AlumnetError, Result};

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, status, payment_status, \
     meal_preference, registration_fee_paid, guest_fees_paid, merchandise_total, \
     donation_amount, total_amount, modification_count, registered_at, updated_at";

const GUEST_COLUMNS: &str = "id, registration_id, name, meal_preference, status, created_at";

#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flattened join row backing [`RegistrationDetail`]
#[derive(FromRow)]
struct DetailRow {
    id: i64,
    event_id: i64,
    user_id: i64,
    status: String,
    payment_status: String,
    meal_preference: Option<String>,
    registration_fee_paid: f64,
    guest_fees_paid: f64,
    merchandise_total: f64,
    donation_amount: f64,
    total_amount: f64,
    modification_count: i32,
    registered_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
    user_email: String,
    user_full_name: String,
    guest_count: i64,
}

impl From<DetailRow> for RegistrationDetail {
    fn from(row: DetailRow) -> Self {
        RegistrationDetail {
            registration: Registration {
                id: row.id,
                event_id: row.event_id,
                user_id: row.user_id,
                status: row.status,
                payment_status: row.payment_status,
                meal_preference: row.meal_preference,
                registration_fee_paid: row.registration_fee_paid,
                guest_fees_paid: row.guest_fees_paid,
                merchandise_total: row.merchandise_total,
                donation_amount: row.donation_amount,
                total_amount: row.total_amount,
                modification_count: row.modification_count,
                registered_at: row.registered_at,
                updated_at: row.updated_at,
            },
            user_email: row.user_email,
            user_full_name: row.user_full_name,
            guest_count: row.guest_count,
        }
    }
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Registration>> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE id = $1",
            REGISTRATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    async fn find_by_event_and_user(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Registration>> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE event_id = $1 AND user_id = $2",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    async fn create_with_responses(
        &self,
        registration: NewRegistration,
        responses: Vec<SubmittedResponse>,
    ) -> Result<Registration> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Registration>(&format!(
            r#"
            INSERT INTO registrations (event_id, user_id, status, payment_status,
                meal_preference, registration_fee_paid, guest_fees_paid, merchandise_total,
                donation_amount, total_amount, modification_count, registered_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, $7, $8, 0, $9, $9)
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        ))
        .bind(registration.event_id)
        .bind(registration.user_id)
        .bind(RegistrationStatus::Confirmed.as_str())
        .bind(&registration.payment_status)
        .bind(registration.meal_preference)
        .bind(registration.registration_fee_paid)
        .bind(registration.donation_amount)
        .bind(registration.total_amount)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AlumnetError::DuplicateRegistration {
                    event_id: registration.event_id,
                }
            }
            _ => AlumnetError::Database(e),
        })?;

        for response in responses {
            sqlx::query(
                "INSERT INTO form_responses (registration_id, field_id, response) VALUES ($1, $2, $3)",
            )
            .bind(created.id)
            .bind(response.field_id)
            .bind(response.response)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, id: i64, changes: RegistrationChanges) -> Result<Registration> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            r#"
            UPDATE registrations
            SET meal_preference = COALESCE($2, meal_preference),
                donation_amount = COALESCE($3, donation_amount),
                guest_fees_paid = COALESCE($4, guest_fees_paid),
                total_amount = COALESCE($5, total_amount),
                modification_count = modification_count + 1,
                updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        ))
        .bind(id)
        .bind(changes.meal_preference)
        .bind(changes.donation_amount)
        .bind(changes.guest_fees_paid)
        .bind(changes.total_amount)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    async fn replace_responses(&self, id: i64, responses: Vec<SubmittedResponse>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM form_responses WHERE registration_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for response in responses {
            sqlx::query(
                "INSERT INTO form_responses (registration_id, field_id, response) VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(response.field_id)
            .bind(response.response)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn cancel(&self, id: i64) -> Result<Registration> {
        let mut tx = self.pool.begin().await?;

        let registration = sqlx::query_as::<_, Registration>(&format!(
            "UPDATE registrations SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            REGISTRATION_COLUMNS
        ))
        .bind(id)
        .bind(RegistrationStatus::Cancelled.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE guests SET status = 'cancelled' WHERE registration_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(registration)
    }

    async fn add_guest(&self, registration_id: i64, guest: NewGuest) -> Result<Guest> {
        let guest = sqlx::query_as::<_, Guest>(&format!(
            r#"
            INSERT INTO guests (registration_id, name, meal_preference, status, created_at)
            VALUES ($1, $2, $3, 'active', $4)
            RETURNING {}
            "#,
            GUEST_COLUMNS
        ))
        .bind(registration_id)
        .bind(guest.name)
        .bind(guest.meal_preference)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(guest)
    }

    async fn find_guest(&self, guest_id: i64) -> Result<Option<Guest>> {
        let guest = sqlx::query_as::<_, Guest>(&format!(
            "SELECT {} FROM guests WHERE id = $1",
            GUEST_COLUMNS
        ))
        .bind(guest_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(guest)
    }

    async fn cancel_guest(&self, guest_id: i64) -> Result<Guest> {
        let guest = sqlx::query_as::<_, Guest>(&format!(
            "UPDATE guests SET status = 'cancelled' WHERE id = $1 RETURNING {}",
            GUEST_COLUMNS
        ))
        .bind(guest_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(guest)
    }

    async fn active_guests(&self, registration_id: i64) -> Result<Vec<Guest>> {
        let guests = sqlx::query_as::<_, Guest>(&format!(
            "SELECT {} FROM guests WHERE registration_id = $1 AND status = 'active' ORDER BY id ASC",
            GUEST_COLUMNS
        ))
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(guests)
    }

    async fn responses(&self, registration_id: i64) -> Result<Vec<FormResponse>> {
        let responses = sqlx::query_as::<_, FormResponse>(
            "SELECT id, registration_id, field_id, response FROM form_responses \
             WHERE registration_id = $1 ORDER BY field_id ASC",
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(responses)
    }

    async fn set_payment_status(&self, id: i64, payment_status: &str) -> Result<Registration> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "UPDATE registrations SET payment_status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            REGISTRATION_COLUMNS
        ))
        .bind(id)
        .bind(payment_status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    async fn list_for_event(&self, event_id: i64) -> Result<Vec<RegistrationDetail>> {
        let rows = sqlx::query_as::<_, DetailRow>(
            r#"
            SELECT r.id, r.event_id, r.user_id, r.status, r.payment_status, r.meal_preference,
                   r.registration_fee_paid, r.guest_fees_paid, r.merchandise_total,
                   r.donation_amount, r.total_amount, r.modification_count, r.registered_at,
                   r.updated_at, u.email AS user_email, u.full_name AS user_full_name,
                   (SELECT COUNT(*) FROM guests g
                     WHERE g.registration_id = r.id AND g.status = 'active') AS guest_count
            FROM registrations r
            INNER JOIN users u ON u.id = r.user_id
            WHERE r.event_id = $1
            ORDER BY r.registered_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RegistrationDetail::from).collect())
    }

    async fn totals(&self) -> Result<RegistrationTotals> {
        let row: (i64, i64, i64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'confirmed'),
                   COUNT(*) FILTER (WHERE status = 'cancelled'),
                   COALESCE(SUM(total_amount) FILTER (WHERE status = 'confirmed'), 0)
            FROM registrations
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(RegistrationTotals {
            total: row.0,
            confirmed: row.1,
            cancelled: row.2,
            revenue: row.3,
        })
    }
}
