//! Practitioner licence entity (LBP register tracking).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Status of a practitioner licence on the public register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "licence_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LicenceStatus {
    /// Licence is current.
    Current,
    /// Licence is suspended.
    Suspended,
    /// Licence has expired.
    Expired,
    /// Licence has been cancelled.
    Cancelled,
}

impl LicenceStatus {
    /// Human-readable label used in notification bodies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Current => "Current",
            Self::Suspended => "Suspended",
            Self::Expired => "Expired",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for LicenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A member's licensed-practitioner registration, mirrored from the
/// public register by an external sync. The engine watches for status
/// changes against the last status it notified on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PractitionerLicence {
    /// Unique licence record identifier.
    pub id: Uuid,
    /// The organization employing the practitioner.
    pub organization_id: Uuid,
    /// The member holding the licence.
    pub member_id: Uuid,
    /// Register licence number.
    pub licence_number: String,
    /// Licence class (e.g. "Carpentry", "Site 2").
    pub licence_class: String,
    /// Current status as mirrored from the register.
    pub status: LicenceStatus,
    /// The status at the time of the last change notification.
    pub last_notified_status: LicenceStatus,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl PractitionerLicence {
    /// Whether the register status differs from the last notified one.
    pub fn status_changed(&self) -> bool {
        self.status != self.last_notified_status
    }
}
