//! Route definitions for the CertHub HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState`
//! and passes it to all handlers via Axum's `State` extractor.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(notification_routes())
        .merge(preference_routes())
        .merge(cron_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// In-app notification feed endpoints.
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(handlers::notification::list))
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/{id}/read",
            put(handlers::notification::mark_read),
        )
        .route(
            "/notifications/read-all",
            put(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}",
            delete(handlers::notification::dismiss),
        )
}

/// Preference settings endpoints.
fn preference_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/preferences/user/{member_id}",
            get(handlers::preference::get_user).put(handlers::preference::update_user),
        )
        .route(
            "/preferences/organization/{organization_id}",
            get(handlers::preference::get_organization)
                .put(handlers::preference::update_organization),
        )
}

/// Sweep trigger endpoints for external schedulers.
fn cron_routes() -> Router<AppState> {
    Router::new()
        .route("/cron/{job}", post(handlers::cron::run_job).get(handlers::cron::run_job))
        .route("/cron", get(handlers::cron::list_jobs))
}

/// Liveness and database connectivity.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

fn build_cors_layer(state: &AppState) -> CorsLayer {
    use tower_http::cors::Any;

    let allowed = &state.config.server.allowed_origins;

    if allowed.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any).allow_methods(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> =
            allowed.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins).allow_methods(Any)
    }
}
