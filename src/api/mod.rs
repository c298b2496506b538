//! HTTP API module
//!
//! Router assembly, shared application state and the JSON envelope.

pub mod admin;
pub mod cart;
pub mod events;
pub mod registrations;
pub mod response;

pub use response::{ApiError, ApiResponse, ApiResult};

use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::middleware::auth::{require_admin, require_auth};
use crate::middleware::rate_limit::{self, RateLimiter};
use crate::services::cache::Cache;
use crate::services::ServiceFactory;

/// Shared state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub services: ServiceFactory,
    pub cache: Arc<dyn Cache>,
    pub settings: Arc<Settings>,
    pub rate_limiter: RateLimiter,
}

/// GET /health
async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let member_routes = Router::new()
        .route("/events", get(events::list_events))
        .route("/events/:event_id", get(events::event_detail))
        .route(
            "/events/:event_id/register",
            post(registrations::register)
                .route_layer(from_fn_with_state(state.clone(), rate_limit::rate_limit)),
        )
        .route(
            "/events/:event_id/my-registration",
            get(registrations::my_registration)
                .put(registrations::update_my_registration)
                .delete(registrations::cancel_my_registration),
        )
        .route(
            "/events/:event_id/my-registration/guests",
            post(registrations::add_guest),
        )
        .route(
            "/events/:event_id/my-registration/guests/:guest_id",
            delete(registrations::remove_guest),
        )
        .route("/events/:event_id/merchandise", get(cart::list_merchandise))
        .route(
            "/events/:event_id/cart",
            get(cart::view_cart).post(cart::add_to_cart),
        )
        .route(
            "/events/:event_id/cart/:line_id",
            put(cart::update_cart_line).delete(cart::remove_cart_line),
        )
        .route("/events/:event_id/checkout", post(cart::checkout));

    let admin_routes = Router::new()
        .route("/events", post(admin::create_event))
        .route(
            "/events/:event_id",
            put(admin::update_event).delete(admin::delete_event),
        )
        .route("/events/:event_id/status", put(admin::set_event_status))
        .route("/events/:event_id/form", put(admin::replace_event_form))
        .route(
            "/events/:event_id/merchandise",
            post(admin::create_merchandise_item),
        )
        .route(
            "/merchandise/:item_id",
            put(admin::update_merchandise_item),
        )
        .route(
            "/events/:event_id/registrations",
            get(admin::list_registrations),
        )
        .route(
            "/events/:event_id/registrations/export",
            get(admin::export_registrations),
        )
        .route(
            "/registrations/:registration_id/payment",
            put(admin::set_payment_status),
        )
        .route("/dashboard", get(admin::dashboard))
        .route_layer(from_fn(require_admin));

    let api = member_routes
        .nest("/admin", admin_routes)
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
