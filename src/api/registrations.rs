//! Registration lifecycle endpoints

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::middleware::auth::CurrentUser;
use crate::models::registration::{Guest, NewGuest, Registration};
use crate::services::invalidation::{evict_after, Mutation};
use crate::services::registration::{
    MyRegistration, RegisterRequest, RegistrationOutcome, UpdateMyRegistrationRequest,
};

/// POST /api/events/:event_id/register
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<ApiResponse<RegistrationOutcome>>> {
    let outcome = state
        .services
        .registrations
        .register(event_id, user.id, request)
        .await?;

    evict_after(state.cache.clone(), Mutation::RegistrationChanged { event_id });

    Ok(ApiResponse::ok_with_message(
        outcome,
        "Registration confirmed",
    ))
}

/// GET /api/events/:event_id/my-registration
pub async fn my_registration(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<MyRegistration>>> {
    let registration = state
        .services
        .registrations
        .my_registration(event_id, user.id)
        .await?;

    Ok(ApiResponse::ok(registration))
}

/// PUT /api/events/:event_id/my-registration
pub async fn update_my_registration(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
    Json(request): Json<UpdateMyRegistrationRequest>,
) -> ApiResult<Json<ApiResponse<Registration>>> {
    let registration = state
        .services
        .registrations
        .update_my_registration(event_id, user.id, request)
        .await?;

    evict_after(state.cache.clone(), Mutation::RegistrationChanged { event_id });

    Ok(ApiResponse::ok_with_message(registration, "Registration updated"))
}

/// DELETE /api/events/:event_id/my-registration
pub async fn cancel_my_registration(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<Registration>>> {
    let registration = state
        .services
        .registrations
        .cancel_my_registration(event_id, user.id)
        .await?;

    evict_after(state.cache.clone(), Mutation::RegistrationChanged { event_id });

    Ok(ApiResponse::ok_with_message(
        registration,
        "Registration cancelled",
    ))
}

/// POST /api/events/:event_id/my-registration/guests
pub async fn add_guest(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
    Json(request): Json<NewGuest>,
) -> ApiResult<Json<ApiResponse<GuestWithTotals>>> {
    let (guest, registration) = state
        .services
        .registrations
        .add_guest(event_id, user.id, request)
        .await?;

    evict_after(state.cache.clone(), Mutation::GuestChanged { event_id });

    Ok(ApiResponse::ok_with_message(
        GuestWithTotals { guest, registration },
        "Guest added",
    ))
}

/// DELETE /api/events/:event_id/my-registration/guests/:guest_id
pub async fn remove_guest(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((event_id, guest_id)): Path<(i64, i64)>,
) -> ApiResult<Json<ApiResponse<Registration>>> {
    let registration = state
        .services
        .registrations
        .remove_guest(event_id, user.id, guest_id)
        .await?;

    evict_after(state.cache.clone(), Mutation::GuestChanged { event_id });

    Ok(ApiResponse::ok_with_message(registration, "Guest removed"))
}

/// A new guest together with the registration's updated totals
#[derive(Debug, serde::Serialize)]
pub struct GuestWithTotals {
    pub guest: Guest,
    pub registration: Registration,
}
