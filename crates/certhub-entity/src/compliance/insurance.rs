//! Insurance policy entity and expiry alert flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Expiry alert thresholds, in days before the expiry date.
pub const EXPIRY_THRESHOLDS: [i64; 3] = [90, 60, 30];

/// Type of insurance cover tracked for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "policy_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    /// Public liability cover.
    PublicLiability,
    /// Professional indemnity cover.
    ProfessionalIndemnity,
    /// Statutory liability cover.
    StatutoryLiability,
    /// Contract works cover.
    ContractWorks,
    /// Motor vehicle fleet cover.
    MotorVehicle,
}

impl PolicyType {
    /// Human-readable label used in notification titles.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PublicLiability => "Public Liability",
            Self::ProfessionalIndemnity => "Professional Indemnity",
            Self::StatutoryLiability => "Statutory Liability",
            Self::ContractWorks => "Contract Works",
            Self::MotorVehicle => "Motor Vehicle",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An insurance policy held by a member organization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InsurancePolicy {
    /// Unique policy identifier.
    pub id: Uuid,
    /// The organization holding the policy.
    pub organization_id: Uuid,
    /// Type of cover.
    pub policy_type: PolicyType,
    /// Insurer name.
    pub insurer: String,
    /// Policy number with the insurer.
    pub policy_number: String,
    /// When the cover lapses.
    pub expiry_date: DateTime<Utc>,
    /// 90-day expiry alert already sent.
    pub alert90_sent: bool,
    /// 60-day expiry alert already sent.
    pub alert60_sent: bool,
    /// 30-day expiry alert already sent.
    pub alert30_sent: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl InsurancePolicy {
    /// Whether the alert for a given threshold has already fired.
    pub fn alert_sent(&self, threshold_days: i64) -> bool {
        match threshold_days {
            90 => self.alert90_sent,
            60 => self.alert60_sent,
            30 => self.alert30_sent,
            _ => false,
        }
    }

    /// Whole days until the policy expires (negative once lapsed).
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expiry_date - now).num_days()
    }
}
