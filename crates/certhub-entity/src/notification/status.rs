//! Notification delivery status and priority enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery lifecycle status of a notification.
///
/// Status only ever moves forward: `Pending → Queued → Sent`, or
/// `Queued → Failed → Sent` via a later retry. Failed records with an
/// exhausted retry budget are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Scheduled for a future send, waiting for the delivery sweep.
    Pending,
    /// Approved and persisted, send attempt in flight or imminent.
    Queued,
    /// Successfully handed to the delivery channel.
    Sent,
    /// The last send attempt failed.
    Failed,
}

impl NotificationStatus {
    /// Check whether moving to `next` is a forward transition.
    pub fn can_transition_to(&self, next: NotificationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Queued)
                | (Self::Queued, Self::Sent)
                | (Self::Queued, Self::Failed)
                | (Self::Failed, Self::Sent)
                | (Self::Failed, Self::Failed)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Priority of a notification.
///
/// `Critical` bypasses all stored preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// Standard priority.
    Normal,
    /// Important, but still subject to preferences.
    High,
    /// Compliance-critical, always delivered.
    Critical,
}

impl NotificationPriority {
    /// Return the priority as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
