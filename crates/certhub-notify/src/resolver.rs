//! Preference resolution: decides send or skip for a notification.

use std::sync::Arc;

use uuid::Uuid;

use certhub_core::AppResult;
use certhub_entity::notification::{NotificationChannel, NotificationKind, NotificationPriority};

use crate::catalog;
use crate::store::PreferenceStore;

/// Outcome of a preference check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendDecision {
    /// Whether the notification should be sent.
    pub send: bool,
    /// The veto reason when `send` is false.
    pub reason: Option<String>,
}

impl SendDecision {
    fn allow() -> Self {
        Self {
            send: true,
            reason: None,
        }
    }

    fn veto(reason: impl Into<String>) -> Self {
        Self {
            send: false,
            reason: Some(reason.into()),
        }
    }
}

/// Resolves whether a notification may be sent, checking organization
/// policy before member preference.
///
/// Organization policy is consulted first so an organization admin can
/// enforce a blanket suppression that members cannot override by leaving
/// their own settings untouched. Member preferences can only narrow
/// further.
#[derive(Debug, Clone)]
pub struct PreferenceResolver {
    /// Preference lookups.
    prefs: Arc<dyn PreferenceStore>,
}

impl PreferenceResolver {
    /// Create a new resolver.
    pub fn new(prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { prefs }
    }

    /// Decide whether to send. First matching rule wins:
    ///
    /// 1. In-app and push have no opt-out surface: always send.
    /// 2. Critical priority bypasses all stored preferences.
    /// 3. Kinds flagged `always_send` in the catalog bypass preferences.
    /// 4. Kinds in the critical-SMS bucket always send on SMS.
    /// 5. Organization master switch, then topic flag, can veto.
    /// 6. Member master switch, then topic flag, can veto.
    /// 7. Otherwise send.
    pub async fn should_send(
        &self,
        organization_id: Option<Uuid>,
        member_id: Option<Uuid>,
        kind: NotificationKind,
        channel: NotificationChannel,
        priority: NotificationPriority,
    ) -> AppResult<SendDecision> {
        if !channel.has_opt_out() {
            return Ok(SendDecision::allow());
        }

        if priority == NotificationPriority::Critical {
            return Ok(SendDecision::allow());
        }

        let routing = catalog::routing(kind);
        if routing.always_send {
            return Ok(SendDecision::allow());
        }

        if channel == NotificationChannel::Sms && routing.sms_critical {
            return Ok(SendDecision::allow());
        }

        if let Some(org_id) = organization_id {
            if let Some(org_prefs) = self.prefs.organization_preferences(org_id).await? {
                if !org_prefs.channel_enabled(channel) {
                    return Ok(SendDecision::veto(format!(
                        "organization has disabled the {channel} channel"
                    )));
                }
                if !org_prefs.allows(routing.topic, channel) {
                    return Ok(SendDecision::veto(format!(
                        "organization has disabled {kind} notifications on {channel}"
                    )));
                }
            }
        }

        if let Some(member_id) = member_id {
            if let Some(user_prefs) = self.prefs.user_preferences(member_id).await? {
                if !user_prefs.channel_enabled(channel) {
                    return Ok(SendDecision::veto(format!(
                        "member has disabled the {channel} channel"
                    )));
                }
                if !user_prefs.allows(routing.topic, channel) {
                    return Ok(SendDecision::veto(format!(
                        "member has opted out of {kind} notifications on {channel}"
                    )));
                }
            }
        }

        Ok(SendDecision::allow())
    }
}
