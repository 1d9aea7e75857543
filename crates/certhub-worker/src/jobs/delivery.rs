//! Delivery sweep jobs: scheduled sends and retries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use certhub_core::result::AppResult;
use certhub_notify::Dispatcher;

use crate::job::SweepJob;
use crate::jobs::{DELIVERY_SWEEP, RETRY_SWEEP};

/// Sends pending notifications whose scheduled time has elapsed.
#[derive(Debug)]
pub struct ScheduledSweepJob {
    dispatcher: Arc<Dispatcher>,
}

impl ScheduledSweepJob {
    /// Create a new scheduled-delivery sweep.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl SweepJob for ScheduledSweepJob {
    fn name(&self) -> &str {
        DELIVERY_SWEEP
    }

    async fn run(&self, now: DateTime<Utc>) -> AppResult<Value> {
        let summary = self.dispatcher.process_scheduled(now).await?;
        Ok(serde_json::to_value(summary)?)
    }
}

/// Re-attempts failed notifications with retry budget remaining.
#[derive(Debug)]
pub struct RetrySweepJob {
    dispatcher: Arc<Dispatcher>,
}

impl RetrySweepJob {
    /// Create a new retry sweep.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl SweepJob for RetrySweepJob {
    fn name(&self) -> &str {
        RETRY_SWEEP
    }

    async fn run(&self, now: DateTime<Utc>) -> AppResult<Value> {
        let summary = self.dispatcher.retry_failed(now).await?;
        Ok(serde_json::to_value(summary)?)
    }
}
