//! Member-facing event read endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::models::event::Event;
use crate::services::cache::cached_or;
use crate::services::event::EventDetail;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<ApiResponse<Vec<Event>>>> {
    let limit = pagination
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = pagination.offset.unwrap_or(0).max(0);

    let key = format!("events:list:{}:{}", limit, offset);
    let services = state.services.clone();
    let events = cached_or(state.cache.as_ref(), &key, move || async move {
        services.events.list_visible(limit, offset).await
    })
    .await?;

    Ok(ApiResponse::ok(events))
}

/// GET /api/events/:event_id
pub async fn event_detail(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<EventDetail>>> {
    let key = format!("events:detail:{}", event_id);
    let services = state.services.clone();
    let detail = cached_or(state.cache.as_ref(), &key, move || async move {
        services.events.detail(event_id).await
    })
    .await?;

    Ok(ApiResponse::ok(detail))
}
