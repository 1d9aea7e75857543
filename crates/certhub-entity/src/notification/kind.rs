//! Notification kind enumeration: the domain events that produce
//! notifications.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain event that triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An insurance policy is approaching its expiry date.
    InsuranceExpiring,
    /// An insurance policy has expired.
    InsuranceExpired,
    /// An audit has been scheduled for the organization.
    AuditScheduled,
    /// An audit has been completed.
    AuditCompleted,
    /// A corrective action was assigned to a member.
    CapaAssigned,
    /// A corrective action is past its due date.
    CapaOverdue,
    /// A compliance document is approaching its review date.
    DocumentReviewDue,
    /// A programme enrolment is approaching its renewal anniversary.
    ProgrammeRenewalDue,
    /// A programme enrolment changed status.
    ProgrammeStatusChange,
    /// A practitioner licence changed status on the public register.
    LicenceStatusChange,
    /// A staff credential is approaching expiry.
    CredentialExpiring,
    /// Welcome message for a new member.
    Welcome,
    /// Portal-wide announcement.
    SystemAnnouncement,
}

impl NotificationKind {
    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsuranceExpiring => "insurance_expiring",
            Self::InsuranceExpired => "insurance_expired",
            Self::AuditScheduled => "audit_scheduled",
            Self::AuditCompleted => "audit_completed",
            Self::CapaAssigned => "capa_assigned",
            Self::CapaOverdue => "capa_overdue",
            Self::DocumentReviewDue => "document_review_due",
            Self::ProgrammeRenewalDue => "programme_renewal_due",
            Self::ProgrammeStatusChange => "programme_status_change",
            Self::LicenceStatusChange => "licence_status_change",
            Self::CredentialExpiring => "credential_expiring",
            Self::Welcome => "welcome",
            Self::SystemAnnouncement => "system_announcement",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = certhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insurance_expiring" => Ok(Self::InsuranceExpiring),
            "insurance_expired" => Ok(Self::InsuranceExpired),
            "audit_scheduled" => Ok(Self::AuditScheduled),
            "audit_completed" => Ok(Self::AuditCompleted),
            "capa_assigned" => Ok(Self::CapaAssigned),
            "capa_overdue" => Ok(Self::CapaOverdue),
            "document_review_due" => Ok(Self::DocumentReviewDue),
            "programme_renewal_due" => Ok(Self::ProgrammeRenewalDue),
            "programme_status_change" => Ok(Self::ProgrammeStatusChange),
            "licence_status_change" => Ok(Self::LicenceStatusChange),
            "credential_expiring" => Ok(Self::CredentialExpiring),
            "welcome" => Ok(Self::Welcome),
            "system_announcement" => Ok(Self::SystemAnnouncement),
            _ => Err(certhub_core::AppError::validation(format!(
                "Invalid notification kind: '{s}'"
            ))),
        }
    }
}
