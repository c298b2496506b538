//! Admin endpoints: event lifecycle, form definition, merchandise
//! management, registration oversight, CSV export and the dashboard

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::response::{ApiError, ApiResponse, ApiResult};
use crate::api::AppState;
use crate::database::store::RegistrationDetail;
use crate::middleware::auth::CurrentUser;
use crate::models::event::{CreateEventRequest, Event, FormField, NewFormField, UpdateEventRequest};
use crate::models::merchandise::{
    CreateMerchandiseItemRequest, MerchandiseItem, UpdateMerchandiseItemRequest,
};
use crate::models::registration::{PaymentStatus, Registration};
use crate::services::cache::cached_or;
use crate::services::dashboard::DashboardStats;
use crate::services::invalidation::{evict_after, Mutation};
use crate::utils::errors::AlumnetError;
use crate::utils::helpers::csv_escape;

/// POST /api/admin/events
pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<Json<ApiResponse<Event>>> {
    let event = state.services.events.create(user.id, request).await?;

    evict_after(state.cache.clone(), Mutation::EventCreated { event_id: event.id });

    Ok(ApiResponse::ok_with_message(event, "Event created"))
}

/// PUT /api/admin/events/:event_id
pub async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(request): Json<UpdateEventRequest>,
) -> ApiResult<Json<ApiResponse<Event>>> {
    let event = state.services.events.update(event_id, request).await?;

    evict_after(state.cache.clone(), Mutation::EventUpdated { event_id });

    Ok(ApiResponse::ok_with_message(event, "Event updated"))
}

/// DELETE /api/admin/events/:event_id
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.services.events.delete(event_id, user.id).await?;

    evict_after(state.cache.clone(), Mutation::EventDeleted { event_id });

    Ok(ApiResponse::ok_with_message((), "Event deleted"))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// PUT /api/admin/events/:event_id/status
pub async fn set_event_status(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(request): Json<SetStatusRequest>,
) -> ApiResult<Json<ApiResponse<Event>>> {
    let event = state
        .services
        .events
        .set_status(event_id, &request.status)
        .await?;

    evict_after(state.cache.clone(), Mutation::EventUpdated { event_id });

    Ok(ApiResponse::ok_with_message(event, "Event status updated"))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceFormRequest {
    pub fields: Vec<NewFormField>,
}

/// PUT /api/admin/events/:event_id/form
pub async fn replace_event_form(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(request): Json<ReplaceFormRequest>,
) -> ApiResult<Json<ApiResponse<Vec<FormField>>>> {
    let fields = state
        .services
        .events
        .replace_form(event_id, request.fields)
        .await?;

    evict_after(state.cache.clone(), Mutation::EventUpdated { event_id });

    Ok(ApiResponse::ok_with_message(fields, "Form updated"))
}

/// POST /api/admin/events/:event_id/merchandise
pub async fn create_merchandise_item(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(request): Json<CreateMerchandiseItemRequest>,
) -> ApiResult<Json<ApiResponse<MerchandiseItem>>> {
    let item = state
        .services
        .merchandise
        .create_item(event_id, request)
        .await?;

    evict_after(state.cache.clone(), Mutation::MerchandiseItemChanged { event_id });

    Ok(ApiResponse::ok_with_message(item, "Merchandise item created"))
}

/// PUT /api/admin/merchandise/:item_id
pub async fn update_merchandise_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(request): Json<UpdateMerchandiseItemRequest>,
) -> ApiResult<Json<ApiResponse<MerchandiseItem>>> {
    let item = state
        .services
        .merchandise
        .update_item(item_id, request)
        .await?;

    evict_after(
        state.cache.clone(),
        Mutation::MerchandiseItemChanged {
            event_id: item.event_id,
        },
    );

    Ok(ApiResponse::ok_with_message(item, "Merchandise item updated"))
}

/// GET /api/admin/events/:event_id/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<Vec<RegistrationDetail>>>> {
    state.services.events.require(event_id).await?;
    let registrations = state
        .services
        .registrations
        .list_for_event(event_id)
        .await?;

    Ok(ApiResponse::ok(registrations))
}

/// GET /api/admin/events/:event_id/registrations/export
pub async fn export_registrations(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<Response> {
    state.services.events.require(event_id).await?;
    let registrations = state
        .services
        .registrations
        .list_for_event(event_id)
        .await?;

    let mut csv = String::from(
        "email,full_name,status,payment_status,meal_preference,guests,total_amount,registered_at\n",
    );
    for detail in &registrations {
        let r = &detail.registration;
        csv.push_str(&format!(
            "{},{},{},{},{},{},{:.2},{}\n",
            csv_escape(&detail.user_email),
            csv_escape(&detail.user_full_name),
            r.status,
            r.payment_status,
            csv_escape(r.meal_preference.as_deref().unwrap_or("")),
            detail.guest_count,
            r.total_amount,
            r.registered_at.format("%Y-%m-%d %H:%M:%S"),
        ));
    }

    let response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"event-{}-registrations.csv\"",
                    event_id
                ),
            ),
        ],
        csv,
    )
        .into_response();

    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct SetPaymentStatusRequest {
    pub payment_status: String,
}

/// PUT /api/admin/registrations/:registration_id/payment
pub async fn set_payment_status(
    State(state): State<AppState>,
    Path(registration_id): Path<i64>,
    Json(request): Json<SetPaymentStatusRequest>,
) -> ApiResult<Json<ApiResponse<Registration>>> {
    if PaymentStatus::parse(&request.payment_status).is_none() {
        return Err(ApiError::from(AlumnetError::InvalidInput(format!(
            "Unknown payment status: {}",
            request.payment_status
        ))));
    }

    let registration = state
        .services
        .registrations
        .set_payment_status(registration_id, &request.payment_status)
        .await?;

    evict_after(
        state.cache.clone(),
        Mutation::PaymentStatusChanged {
            event_id: registration.event_id,
        },
    );

    Ok(ApiResponse::ok_with_message(registration, "Payment status updated"))
}

/// GET /api/admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<DashboardStats>>> {
    let services = state.services.clone();
    let stats = cached_or(state.cache.as_ref(), "dashboard:stats", move || async move {
        services.dashboard.stats().await
    })
    .await?;

    Ok(ApiResponse::ok(stats))
}
