//! Merchandise, cart and checkout endpoints

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::middleware::auth::CurrentUser;
use crate::models::merchandise::{CartLine, CheckoutOutcome, MerchandiseItem};
use crate::services::cache::cached_or;
use crate::services::invalidation::{evict_after, Mutation};
use crate::services::merchandise::{AddCartLineRequest, UpdateCartLineRequest};

/// GET /api/events/:event_id/merchandise
pub async fn list_merchandise(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<Vec<MerchandiseItem>>>> {
    let key = format!("events:{}:merchandise", event_id);
    let services = state.services.clone();
    let items = cached_or(state.cache.as_ref(), &key, move || async move {
        services.merchandise.list_items(event_id).await
    })
    .await?;

    Ok(ApiResponse::ok(items))
}

/// The caller's open cart with its running total
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub cart_total: f64,
}

/// GET /api/events/:event_id/cart
pub async fn view_cart(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<CartView>>> {
    let lines = state.services.merchandise.cart(event_id, user.id).await?;
    let cart_total = lines.iter().map(CartLine::line_total).sum();

    Ok(ApiResponse::ok(CartView { lines, cart_total }))
}

/// POST /api/events/:event_id/cart
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
    Json(request): Json<AddCartLineRequest>,
) -> ApiResult<Json<ApiResponse<CartLine>>> {
    let line = state
        .services
        .merchandise
        .add_to_cart(event_id, user.id, request)
        .await?;

    Ok(ApiResponse::ok_with_message(line, "Added to cart"))
}

/// PUT /api/events/:event_id/cart/:line_id
pub async fn update_cart_line(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((event_id, line_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateCartLineRequest>,
) -> ApiResult<Json<ApiResponse<CartLine>>> {
    let line = state
        .services
        .merchandise
        .update_cart_line(event_id, user.id, line_id, request)
        .await?;

    Ok(ApiResponse::ok_with_message(line, "Cart updated"))
}

/// DELETE /api/events/:event_id/cart/:line_id
pub async fn remove_cart_line(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((event_id, line_id)): Path<(i64, i64)>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .services
        .merchandise
        .remove_cart_line(event_id, user.id, line_id)
        .await?;

    Ok(ApiResponse::ok_with_message((), "Removed from cart"))
}

/// POST /api/events/:event_id/checkout
pub async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<CheckoutOutcome>>> {
    let outcome = state
        .services
        .merchandise
        .checkout(event_id, user.id)
        .await?;

    evict_after(state.cache.clone(), Mutation::CheckoutCompleted { event_id });

    Ok(ApiResponse::ok_with_message(outcome, "Order placed"))
}
