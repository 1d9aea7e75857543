//! Cron scheduler for the registered sweeps.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use certhub_core::config::worker::WorkerConfig;
use certhub_core::error::AppError;

use crate::job::SweepRegistry;
use crate::jobs;

/// Runs registered sweeps on their configured cron schedules.
pub struct SweepScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// Sweep registry shared with the HTTP cron endpoints.
    registry: Arc<SweepRegistry>,
}

impl std::fmt::Debug for SweepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepScheduler").finish()
    }
}

impl SweepScheduler {
    /// Create a new sweep scheduler.
    pub async fn new(registry: Arc<SweepRegistry>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            registry,
        })
    }

    /// Register every sweep on its configured schedule.
    pub async fn register_schedules(&self, config: &WorkerConfig) -> Result<(), AppError> {
        let schedules = [
            (jobs::DELIVERY_SWEEP, config.delivery_schedule.as_str()),
            (jobs::RETRY_SWEEP, config.retry_schedule.as_str()),
            (jobs::INSURANCE_SWEEP, config.insurance_schedule.as_str()),
            (jobs::DOCUMENT_SWEEP, config.document_schedule.as_str()),
            (jobs::ENROLMENT_SWEEP, config.enrolment_schedule.as_str()),
            (jobs::CAPA_SWEEP, config.capa_schedule.as_str()),
            (jobs::LICENCE_SWEEP, config.licence_schedule.as_str()),
        ];

        for (name, schedule) in schedules {
            self.add_schedule(name, schedule).await?;
        }

        tracing::info!("All sweep schedules registered");
        Ok(())
    }

    async fn add_schedule(&self, name: &'static str, schedule: &str) -> Result<(), AppError> {
        let registry = Arc::clone(&self.registry);
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let registry = Arc::clone(&registry);
            Box::pin(async move {
                if let Err(e) = registry.run(name, Utc::now()).await {
                    tracing::error!(job = name, error = %e, "Scheduled sweep failed");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create '{name}' schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add '{name}' schedule: {e}")))?;

        tracing::info!("Registered: {} ({})", name, schedule);
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Sweep scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Sweep scheduler shut down");
        Ok(())
    }
}
