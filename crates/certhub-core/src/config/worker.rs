//! Scheduled sweep configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the in-process cron scheduler.
///
/// Each field is a 6-field cron expression (`sec min hour dom month dow`).
/// Sweeps remain invocable through the HTTP cron endpoints regardless of
/// whether the in-process scheduler is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the in-process scheduler runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Scheduled-notification delivery sweep.
    #[serde(default = "default_delivery_schedule")]
    pub delivery_schedule: String,
    /// Failed-notification retry sweep.
    #[serde(default = "default_retry_schedule")]
    pub retry_schedule: String,
    /// Insurance expiry sweep.
    #[serde(default = "default_daily_schedule")]
    pub insurance_schedule: String,
    /// Document review-date sweep.
    #[serde(default = "default_daily_schedule")]
    pub document_schedule: String,
    /// Programme renewal anniversary sweep.
    #[serde(default = "default_daily_schedule")]
    pub enrolment_schedule: String,
    /// Overdue corrective-action sweep.
    #[serde(default = "default_capa_schedule")]
    pub capa_schedule: String,
    /// Practitioner licence status sweep.
    #[serde(default = "default_licence_schedule")]
    pub licence_schedule: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delivery_schedule: default_delivery_schedule(),
            retry_schedule: default_retry_schedule(),
            insurance_schedule: default_daily_schedule(),
            document_schedule: default_daily_schedule(),
            enrolment_schedule: default_daily_schedule(),
            capa_schedule: default_capa_schedule(),
            licence_schedule: default_licence_schedule(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Every minute.
fn default_delivery_schedule() -> String {
    "0 * * * * *".to_string()
}

/// Every 5 minutes.
fn default_retry_schedule() -> String {
    "0 */5 * * * *".to_string()
}

/// Daily at 6 AM.
fn default_daily_schedule() -> String {
    "0 0 6 * * *".to_string()
}

/// Every 6 hours.
fn default_capa_schedule() -> String {
    "0 0 */6 * * *".to_string()
}

/// Every hour.
fn default_licence_schedule() -> String {
    "0 0 * * * *".to_string()
}
