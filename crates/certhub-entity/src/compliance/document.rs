//! Compliance document entity and review alert flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Review alert thresholds, in days before the review date.
pub const REVIEW_THRESHOLDS: [i64; 2] = [30, 7];

/// A controlled document (policy manual, procedure, safety plan) with a
/// scheduled review date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComplianceDocument {
    /// Unique document identifier.
    pub id: Uuid,
    /// The owning organization.
    pub organization_id: Uuid,
    /// Document title.
    pub title: String,
    /// When the document must next be reviewed.
    pub review_date: DateTime<Utc>,
    /// 30-day review alert already sent.
    pub review_alert30_sent: bool,
    /// 7-day review alert already sent.
    pub review_alert7_sent: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ComplianceDocument {
    /// Whether the alert for a given threshold has already fired.
    pub fn review_alert_sent(&self, threshold_days: i64) -> bool {
        match threshold_days {
            30 => self.review_alert30_sent,
            7 => self.review_alert7_sent,
            _ => false,
        }
    }

    /// Whole days until the review date (negative once overdue).
    pub fn days_until_review(&self, now: DateTime<Utc>) -> i64 {
        (self.review_date - now).num_days()
    }
}
