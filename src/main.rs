//! CertHub Server — compliance portal notification engine.
//!
//! Main entry point that wires configuration, database, the dispatch
//! engine, the sweep scheduler, and the HTTP API together.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use certhub_api::AppState;
use certhub_core::config::AppConfig;
use certhub_core::error::AppError;
use certhub_database::repositories::{NotificationRepository, PreferenceRepository};
use certhub_database::DatabasePool;
use certhub_notify::channel::{HttpEmailProvider, HttpSmsProvider};
use certhub_notify::{Dispatcher, PreferenceResolver};
use certhub_worker::jobs::{
    DocumentReviewJob, InsuranceExpiryJob, LicenceStatusJob, OverdueCapaJob, ProgrammeRenewalJob,
    RetrySweepJob, ScheduledSweepJob,
};
use certhub_worker::{SweepRegistry, SweepScheduler};

#[tokio::main]
async fn main() {
    let env = std::env::var("CERTHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CertHub v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(config);

    // Database + migrations.
    let db = DatabasePool::connect(&config.database).await?;
    certhub_database::migration::run_migrations(db.pool()).await?;
    let pool = db.pool().clone();

    // Repositories.
    let notifications = NotificationRepository::new(pool.clone());
    let preferences = PreferenceRepository::new(pool.clone());

    // The dispatch engine.
    let resolver = PreferenceResolver::new(Arc::new(preferences.clone()));
    let email = Arc::new(HttpEmailProvider::new(config.notify.email.clone())?);
    let sms = Arc::new(HttpSmsProvider::new(config.notify.sms.clone())?);
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(notifications.clone()),
        resolver,
        email,
        sms,
        config.notify.clone(),
    ));

    // Sweep jobs, shared by the scheduler and the cron endpoints.
    let portal = config.notify.portal_base_url.clone();
    let mut registry = SweepRegistry::new();
    registry.register(Arc::new(ScheduledSweepJob::new(dispatcher.clone())));
    registry.register(Arc::new(RetrySweepJob::new(dispatcher.clone())));
    registry.register(Arc::new(InsuranceExpiryJob::new(
        pool.clone(),
        dispatcher.clone(),
        portal.clone(),
    )));
    registry.register(Arc::new(DocumentReviewJob::new(
        pool.clone(),
        dispatcher.clone(),
        portal.clone(),
    )));
    registry.register(Arc::new(ProgrammeRenewalJob::new(
        pool.clone(),
        dispatcher.clone(),
        portal.clone(),
    )));
    registry.register(Arc::new(OverdueCapaJob::new(
        pool.clone(),
        dispatcher.clone(),
        portal.clone(),
    )));
    registry.register(Arc::new(LicenceStatusJob::new(
        pool.clone(),
        dispatcher.clone(),
        portal,
    )));
    let registry = Arc::new(registry);

    // In-process scheduler. Kept alive for the lifetime of the server.
    let mut scheduler = None;
    if config.worker.enabled {
        let sweep_scheduler = SweepScheduler::new(registry.clone()).await?;
        sweep_scheduler.register_schedules(&config.worker).await?;
        sweep_scheduler.start().await?;
        scheduler = Some(sweep_scheduler);
    } else {
        tracing::info!("In-process scheduler disabled; sweeps run via cron endpoints only");
    }

    // HTTP server.
    let state = AppState {
        config: config.clone(),
        db: db.clone(),
        notifications,
        preferences,
        dispatcher,
        sweeps: registry,
    };
    let app = certhub_api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server failed: {e}")))?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    db.close().await;
    Ok(())
}
