//! Sweep job trait and registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use certhub_core::error::AppError;
use certhub_core::result::AppResult;

/// A named, idempotent sweep.
///
/// Each run receives the sweep time explicitly so the cron scheduler,
/// the HTTP cron endpoints, and tests all drive the same code path.
#[async_trait]
pub trait SweepJob: Send + Sync + std::fmt::Debug {
    /// Registry name, also the `{job}` segment of the cron endpoint.
    fn name(&self) -> &str;

    /// Run the sweep. Returns a JSON summary of what the run did.
    async fn run(&self, now: DateTime<Utc>) -> AppResult<Value>;
}

/// Dispatches sweep runs to registered jobs by name.
#[derive(Debug, Default)]
pub struct SweepRegistry {
    jobs: HashMap<String, Arc<dyn SweepJob>>,
}

impl SweepRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sweep job.
    pub fn register(&mut self, job: Arc<dyn SweepJob>) {
        let name = job.name().to_string();
        tracing::info!("Registered sweep job '{}'", name);
        self.jobs.insert(name, job);
    }

    /// Run a sweep by name.
    pub async fn run(&self, name: &str, now: DateTime<Utc>) -> AppResult<Value> {
        let job = self
            .jobs
            .get(name)
            .ok_or_else(|| AppError::not_found(format!("No sweep job named '{name}'")))?;

        tracing::info!(job = name, "Running sweep");
        let summary = job.run(now).await?;
        tracing::info!(job = name, %summary, "Sweep finished");
        Ok(summary)
    }

    /// Whether a job is registered under the given name.
    pub fn has_job(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// Names of all registered jobs.
    pub fn job_names(&self) -> Vec<String> {
        self.jobs.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certhub_core::ErrorKind;

    #[derive(Debug)]
    struct CountingJob;

    #[async_trait]
    impl SweepJob for CountingJob {
        fn name(&self) -> &str {
            "counting"
        }

        async fn run(&self, _now: DateTime<Utc>) -> AppResult<Value> {
            Ok(serde_json::json!({"examined": 0}))
        }
    }

    #[tokio::test]
    async fn test_runs_registered_job() {
        let mut registry = SweepRegistry::new();
        registry.register(Arc::new(CountingJob));
        assert!(registry.has_job("counting"));

        let summary = registry.run("counting", Utc::now()).await.unwrap();
        assert_eq!(summary["examined"], 0);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let registry = SweepRegistry::new();
        let err = registry.run("missing", Utc::now()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
