//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::channel::NotificationChannel;
use super::kind::NotificationKind;
use super::status::{NotificationPriority, NotificationStatus};

/// One attempted message, across every channel.
///
/// Rows are never deleted; they form the delivery audit trail. In-app
/// notifications are additionally the deliverable itself, surfaced by the
/// portal API with read/dismiss state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The organization this notification concerns, if any.
    pub organization_id: Option<Uuid>,
    /// The member this notification concerns, if any.
    pub member_id: Option<Uuid>,
    /// Domain event that produced this notification.
    pub kind: NotificationKind,
    /// Delivery channel.
    pub channel: NotificationChannel,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Notification title (email subject).
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Optional call-to-action link into the portal.
    pub action_url: Option<String>,
    /// Recipient address: email address or phone number, depending on
    /// channel. Not required for in-app or push.
    pub recipient: Option<String>,
    /// Delivery lifecycle status.
    pub status: NotificationStatus,
    /// Number of failed send attempts so far.
    pub retry_count: i32,
    /// Message id assigned by the external provider on success.
    pub external_id: Option<String>,
    /// Reason recorded for the most recent failure.
    pub failure_reason: Option<String>,
    /// When to send, for scheduled notifications.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// When the notification was successfully sent.
    pub sent_at: Option<DateTime<Utc>>,
    /// When the last retry attempt started.
    pub last_retry_at: Option<DateTime<Utc>>,
    /// When the next retry becomes due. Cleared once the retry budget is
    /// exhausted.
    pub next_retry_at: Option<DateTime<Utc>>,
    /// Whether the member has read this notification (in-app only).
    pub is_read: bool,
    /// When the notification was read.
    pub read_at: Option<DateTime<Utc>>,
    /// Whether the member dismissed this notification (in-app only).
    pub is_dismissed: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Check whether the retry budget is exhausted.
    pub fn retries_exhausted(&self, max_retries: u32) -> bool {
        self.retry_count >= max_retries as i32
    }

    /// Check whether this is a terminal failure: failed, out of retries,
    /// surfaced for manual follow-up.
    pub fn is_terminal_failure(&self, max_retries: u32) -> bool {
        self.status == NotificationStatus::Failed && self.retries_exhausted(max_retries)
    }

    /// Check whether a scheduled notification is due to send.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.scheduled_for {
            Some(at) => at <= now,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: NotificationStatus, retry_count: i32) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            organization_id: None,
            member_id: None,
            kind: NotificationKind::Welcome,
            channel: NotificationChannel::Email,
            priority: NotificationPriority::Normal,
            title: "Welcome".to_string(),
            body: "Hello".to_string(),
            action_url: None,
            recipient: Some("member@example.org".to_string()),
            status,
            retry_count,
            external_id: None,
            failure_reason: None,
            scheduled_for: None,
            sent_at: None,
            last_retry_at: None,
            next_retry_at: None,
            is_read: false,
            read_at: None,
            is_dismissed: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_terminal_failure() {
        assert!(sample(NotificationStatus::Failed, 3).is_terminal_failure(3));
        assert!(!sample(NotificationStatus::Failed, 2).is_terminal_failure(3));
        assert!(!sample(NotificationStatus::Sent, 3).is_terminal_failure(3));
    }

    #[test]
    fn test_is_due() {
        let now = Utc::now();
        let mut n = sample(NotificationStatus::Pending, 0);
        assert!(n.is_due(now));
        n.scheduled_for = Some(now + chrono::Duration::hours(1));
        assert!(!n.is_due(now));
        n.scheduled_for = Some(now - chrono::Duration::hours(1));
        assert!(n.is_due(now));
    }
}
