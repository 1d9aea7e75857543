//! Notification channel enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery channel for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_channel", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Delivered through the email provider.
    Email,
    /// Delivered through the SMS gateway.
    Sms,
    /// Stored row surfaced in the portal notification centre.
    InApp,
    /// Mobile push. Not wired to a provider yet; explicit no-op.
    Push,
}

impl NotificationChannel {
    /// Whether users/organizations have an opt-out surface for this channel.
    ///
    /// In-app and push have none, so preference checks never apply to them.
    pub fn has_opt_out(&self) -> bool {
        matches!(self, Self::Email | Self::Sms)
    }

    /// Whether this channel requires a recipient address on the row.
    pub fn requires_recipient(&self) -> bool {
        matches!(self, Self::Email | Self::Sms)
    }

    /// Return the channel as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::InApp => "in_app",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = certhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            "in_app" => Ok(Self::InApp),
            "push" => Ok(Self::Push),
            _ => Err(certhub_core::AppError::validation(format!(
                "Invalid notification channel: '{s}'. Expected one of: email, sms, in_app, push"
            ))),
        }
    }
}
