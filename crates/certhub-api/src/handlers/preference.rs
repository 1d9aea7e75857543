//! Preference settings handlers.
//!
//! The settings UIs own these records; the engine only reads them. The
//! organization GET lazily creates an allow-all record so the settings
//! screen always has something to render.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use certhub_core::error::AppError;
use certhub_entity::notification::{
    OrganizationNotificationPreference, UserNotificationPreference,
};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/preferences/user/{member_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let prefs = state.preferences.get_user_or_defaults(member_id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": prefs })))
}

/// PUT /api/preferences/user/{member_id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
    Json(mut prefs): Json<UserNotificationPreference>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if prefs.member_id != member_id {
        return Err(AppError::validation(
            "Preference record does not match the path member id",
        )
        .into());
    }
    prefs.updated_at = None;
    state.preferences.upsert_user(&prefs).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": prefs })))
}

/// GET /api/preferences/organization/{organization_id}
pub async fn get_organization(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let prefs = state
        .preferences
        .get_or_create_organization(organization_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": prefs })))
}

/// PUT /api/preferences/organization/{organization_id}
pub async fn update_organization(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
    Json(mut prefs): Json<OrganizationNotificationPreference>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if prefs.organization_id != organization_id {
        return Err(AppError::validation(
            "Preference record does not match the path organization id",
        )
        .into());
    }
    prefs.updated_at = None;
    state.preferences.upsert_organization(&prefs).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": prefs })))
}
