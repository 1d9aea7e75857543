//! In-app notification feed handlers.
//!
//! IN_APP notification rows are themselves the deliverable; these
//! endpoints surface them to the portal. Identity is resolved upstream,
//! so the member id arrives as an explicit parameter.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use certhub_core::types::pagination::PageRequest;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the feed endpoints.
#[derive(Debug, Deserialize)]
pub struct FeedParams {
    /// The member whose feed is requested.
    pub member_id: Uuid,
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page.
    pub page_size: Option<u64>,
}

impl FeedParams {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.page_size.unwrap_or(25))
    }
}

/// GET /api/notifications?member_id=...
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state
        .notifications
        .find_in_app_for_member(params.member_id, &params.page_request())
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": result })))
}

/// GET /api/notifications/unread-count?member_id=...
pub async fn unread_count(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.notifications.count_unread(params.member_id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "count": count } }),
    ))
}

/// PUT /api/notifications/{id}/read?member_id=...
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<FeedParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.notifications.mark_read(id, params.member_id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "Marked as read" } }),
    ))
}

/// PUT /api/notifications/read-all?member_id=...
pub async fn mark_all_read(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.notifications.mark_all_read(params.member_id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "marked": count } }),
    ))
}

/// DELETE /api/notifications/{id}?member_id=...
pub async fn dismiss(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<FeedParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.notifications.dismiss(id, params.member_id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "Dismissed" } }),
    ))
}
