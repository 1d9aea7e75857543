//! User and organization notification preference entities.
//!
//! Both records carry per-channel master switches plus one flag per
//! (topic, channel) combination. The organization record is consulted
//! before the user record: organization policy can veto a send outright,
//! and a user can only narrow further, never widen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::channel::NotificationChannel;

/// Preference topic a notification kind maps to.
///
/// Topics group related kinds under a single opt-out flag per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceTopic {
    /// Insurance expiry and lapse alerts.
    Insurance,
    /// Audit scheduling and completion.
    Audit,
    /// Corrective action assignments and overdue alerts.
    CorrectiveAction,
    /// Document review-date alerts.
    Document,
    /// Programme enrolment and renewal.
    Programme,
    /// Staff credential and licence alerts.
    Credential,
    /// Welcome messages and announcements.
    System,
}

/// Per-member notification preferences. Owned by the member settings UI;
/// read-only to the engine. Absence of a record defaults to allow.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserNotificationPreference {
    /// The member these preferences belong to.
    pub member_id: Uuid,
    /// Master switch for the email channel.
    pub email_enabled: bool,
    /// Master switch for the SMS channel.
    pub sms_enabled: bool,
    /// Email opt-in per topic.
    pub email_insurance: bool,
    pub email_audit: bool,
    pub email_corrective_action: bool,
    pub email_document: bool,
    pub email_programme: bool,
    pub email_credential: bool,
    pub email_system: bool,
    /// SMS opt-in per topic.
    pub sms_insurance: bool,
    pub sms_audit: bool,
    pub sms_corrective_action: bool,
    pub sms_document: bool,
    pub sms_programme: bool,
    pub sms_credential: bool,
    pub sms_system: bool,
    /// When preferences were last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserNotificationPreference {
    /// Allow-all defaults for a member without stored preferences.
    pub fn default_for_member(member_id: Uuid) -> Self {
        Self {
            member_id,
            email_enabled: true,
            sms_enabled: true,
            email_insurance: true,
            email_audit: true,
            email_corrective_action: true,
            email_document: true,
            email_programme: true,
            email_credential: true,
            email_system: true,
            sms_insurance: true,
            sms_audit: true,
            sms_corrective_action: true,
            sms_document: true,
            sms_programme: true,
            sms_credential: true,
            sms_system: true,
            updated_at: Some(Utc::now()),
        }
    }

    /// Master switch for a channel. Channels without an opt-out surface
    /// always report enabled.
    pub fn channel_enabled(&self, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Email => self.email_enabled,
            NotificationChannel::Sms => self.sms_enabled,
            NotificationChannel::InApp | NotificationChannel::Push => true,
        }
    }

    /// Topic-level flag for a channel.
    pub fn allows(&self, topic: PreferenceTopic, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Email => match topic {
                PreferenceTopic::Insurance => self.email_insurance,
                PreferenceTopic::Audit => self.email_audit,
                PreferenceTopic::CorrectiveAction => self.email_corrective_action,
                PreferenceTopic::Document => self.email_document,
                PreferenceTopic::Programme => self.email_programme,
                PreferenceTopic::Credential => self.email_credential,
                PreferenceTopic::System => self.email_system,
            },
            NotificationChannel::Sms => match topic {
                PreferenceTopic::Insurance => self.sms_insurance,
                PreferenceTopic::Audit => self.sms_audit,
                PreferenceTopic::CorrectiveAction => self.sms_corrective_action,
                PreferenceTopic::Document => self.sms_document,
                PreferenceTopic::Programme => self.sms_programme,
                PreferenceTopic::Credential => self.sms_credential,
                PreferenceTopic::System => self.sms_system,
            },
            NotificationChannel::InApp | NotificationChannel::Push => true,
        }
    }
}

/// Per-organization notification preferences. Checked before user
/// preferences; lazily created with allow-all defaults on first read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationNotificationPreference {
    /// The organization these preferences belong to.
    pub organization_id: Uuid,
    /// Master switch for the email channel.
    pub email_enabled: bool,
    /// Master switch for the SMS channel.
    pub sms_enabled: bool,
    /// Email policy per topic.
    pub email_insurance: bool,
    pub email_audit: bool,
    pub email_corrective_action: bool,
    pub email_document: bool,
    pub email_programme: bool,
    pub email_credential: bool,
    pub email_system: bool,
    /// SMS policy per topic.
    pub sms_insurance: bool,
    pub sms_audit: bool,
    pub sms_corrective_action: bool,
    pub sms_document: bool,
    pub sms_programme: bool,
    pub sms_credential: bool,
    pub sms_system: bool,
    /// When preferences were last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrganizationNotificationPreference {
    /// Allow-all defaults created on first read.
    pub fn default_for_organization(organization_id: Uuid) -> Self {
        Self {
            organization_id,
            email_enabled: true,
            sms_enabled: true,
            email_insurance: true,
            email_audit: true,
            email_corrective_action: true,
            email_document: true,
            email_programme: true,
            email_credential: true,
            email_system: true,
            sms_insurance: true,
            sms_audit: true,
            sms_corrective_action: true,
            sms_document: true,
            sms_programme: true,
            sms_credential: true,
            sms_system: true,
            updated_at: Some(Utc::now()),
        }
    }

    /// Master switch for a channel. Channels without an opt-out surface
    /// always report enabled.
    pub fn channel_enabled(&self, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Email => self.email_enabled,
            NotificationChannel::Sms => self.sms_enabled,
            NotificationChannel::InApp | NotificationChannel::Push => true,
        }
    }

    /// Topic-level flag for a channel.
    pub fn allows(&self, topic: PreferenceTopic, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Email => match topic {
                PreferenceTopic::Insurance => self.email_insurance,
                PreferenceTopic::Audit => self.email_audit,
                PreferenceTopic::CorrectiveAction => self.email_corrective_action,
                PreferenceTopic::Document => self.email_document,
                PreferenceTopic::Programme => self.email_programme,
                PreferenceTopic::Credential => self.email_credential,
                PreferenceTopic::System => self.email_system,
            },
            NotificationChannel::Sms => match topic {
                PreferenceTopic::Insurance => self.sms_insurance,
                PreferenceTopic::Audit => self.sms_audit,
                PreferenceTopic::CorrectiveAction => self.sms_corrective_action,
                PreferenceTopic::Document => self.sms_document,
                PreferenceTopic::Programme => self.sms_programme,
                PreferenceTopic::Credential => self.sms_credential,
                PreferenceTopic::System => self.sms_system,
            },
            NotificationChannel::InApp | NotificationChannel::Push => true,
        }
    }
}
