//! Application state shared across all handlers.

use std::sync::Arc;

use certhub_core::config::AppConfig;
use certhub_database::repositories::{NotificationRepository, PreferenceRepository};
use certhub_database::DatabasePool;
use certhub_notify::Dispatcher;
use certhub_worker::SweepRegistry;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All heavyweight
/// fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool wrapper.
    pub db: DatabasePool,
    /// Notification rows and the in-app feed.
    pub notifications: NotificationRepository,
    /// Preference records.
    pub preferences: PreferenceRepository,
    /// The dispatch engine.
    pub dispatcher: Arc<Dispatcher>,
    /// Registered sweep jobs, run by the cron endpoints.
    pub sweeps: Arc<SweepRegistry>,
}
