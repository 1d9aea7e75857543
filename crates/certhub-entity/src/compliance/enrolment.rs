//! Programme enrolment entity and renewal alert flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Renewal alert thresholds, in days before the anniversary date.
pub const RENEWAL_THRESHOLDS: [i64; 3] = [90, 60, 30];

/// Status of a programme enrolment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrolment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrolmentStatus {
    /// In good standing.
    Active,
    /// Renewal window open, awaiting renewal.
    RenewalDue,
    /// Suspended by the association.
    Suspended,
    /// Withdrawn by the organization.
    Withdrawn,
}

impl EnrolmentStatus {
    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::RenewalDue => "renewal_due",
            Self::Suspended => "suspended",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for EnrolmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An organization's enrolment in a certification programme, renewed
/// annually on its anniversary date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrolment {
    /// Unique enrolment identifier.
    pub id: Uuid,
    /// The enrolled organization.
    pub organization_id: Uuid,
    /// Programme name.
    pub programme: String,
    /// Enrolment status.
    pub status: EnrolmentStatus,
    /// Next renewal anniversary.
    pub anniversary_date: DateTime<Utc>,
    /// 90-day renewal alert already sent.
    pub renewal_alert90_sent: bool,
    /// 60-day renewal alert already sent.
    pub renewal_alert60_sent: bool,
    /// 30-day renewal alert already sent.
    pub renewal_alert30_sent: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Enrolment {
    /// Whether the alert for a given threshold has already fired.
    pub fn renewal_alert_sent(&self, threshold_days: i64) -> bool {
        match threshold_days {
            90 => self.renewal_alert90_sent,
            60 => self.renewal_alert60_sent,
            30 => self.renewal_alert30_sent,
            _ => false,
        }
    }

    /// Whole days until the anniversary (negative once passed).
    pub fn days_until_anniversary(&self, now: DateTime<Utc>) -> i64 {
        (self.anniversary_date - now).num_days()
    }

    /// Every threshold that is crossed but has not yet fired.
    ///
    /// An enrolment that has not been swept for a while can have several
    /// thresholds newly crossed at once; all of them must fire in a single
    /// pass, not just the nearest one.
    pub fn due_renewal_thresholds(&self, now: DateTime<Utc>) -> Vec<i64> {
        let days = self.days_until_anniversary(now);
        RENEWAL_THRESHOLDS
            .iter()
            .copied()
            .filter(|t| days <= *t && !self.renewal_alert_sent(*t))
            .collect()
    }
}
