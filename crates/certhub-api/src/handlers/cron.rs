//! Sweep trigger handlers for external schedulers.
//!
//! Every registered sweep can be run by name, guarded by a shared
//! secret in the `x-cron-secret` header. An empty configured secret
//! disables the endpoints entirely.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;

use certhub_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

const CRON_SECRET_HEADER: &str = "x-cron-secret";

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let secret = &state.config.server.cron_secret;
    if secret.is_empty() {
        return Err(AppError::service_unavailable(
            "Cron endpoints are disabled; no cron secret is configured",
        ));
    }

    let provided = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided != secret {
        return Err(AppError::authorization("Invalid cron secret"));
    }
    Ok(())
}

/// POST (or GET) /api/cron/{job}
pub async fn run_job(
    State(state): State<AppState>,
    Path(job): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;

    let summary = state.sweeps.run(&job, Utc::now()).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "job": job,
        "data": summary,
    })))
}

/// GET /api/cron
pub async fn list_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;

    let mut names = state.sweeps.job_names();
    names.sort();
    Ok(Json(serde_json::json!({ "success": true, "data": names })))
}
