//! Notification dispatcher: approval, persistence, and channel sends.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use certhub_core::config::notify::NotifyConfig;
use certhub_core::{AppError, AppResult};
use certhub_entity::notification::{
    Notification, NotificationChannel, NotificationKind, NotificationPriority, NotificationStatus,
};

use crate::backoff;
use crate::channel::{EmailMessage, EmailSender, SmsSender};
use crate::resolver::PreferenceResolver;
use crate::store::NotificationStore;
use crate::template;

/// Parameters for creating a notification.
///
/// Malformed params fail fast with a validation error; they are never
/// silently recorded.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotificationParams {
    /// The organization this notification concerns, if any.
    pub organization_id: Option<Uuid>,
    /// The member this notification concerns, if any.
    pub member_id: Option<Uuid>,
    /// Domain event.
    pub kind: NotificationKind,
    /// Delivery channel.
    pub channel: NotificationChannel,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Title (email subject).
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Body text.
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
    /// Optional call-to-action link.
    #[validate(url)]
    pub action_url: Option<String>,
    /// Recipient address (email or phone, depending on channel).
    pub recipient: Option<String>,
    /// Optional future send time. Past or absent means send immediately.
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Outcome of a create or send call.
///
/// Channel failures are reflected here rather than propagated; callers
/// must inspect `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResult {
    /// Whether the operation completed without a delivery failure.
    /// A preference skip still counts as success.
    pub success: bool,
    /// Whether the send was vetoed by preferences.
    pub skipped: bool,
    /// Veto or failure reason, when applicable.
    pub reason: Option<String>,
    /// The persisted notification row, when one was created.
    pub notification_id: Option<Uuid>,
    /// Provider-assigned message id, when the channel returned one.
    pub external_id: Option<String>,
}

impl SendResult {
    fn skipped(reason: String) -> Self {
        Self {
            success: true,
            skipped: true,
            reason: Some(reason),
            notification_id: None,
            external_id: None,
        }
    }

    fn scheduled(id: Uuid) -> Self {
        Self {
            success: true,
            skipped: false,
            reason: None,
            notification_id: Some(id),
            external_id: None,
        }
    }

    fn sent(id: Uuid, external_id: Option<String>) -> Self {
        Self {
            success: true,
            skipped: false,
            reason: None,
            notification_id: Some(id),
            external_id,
        }
    }

    fn failed(id: Uuid, reason: String) -> Self {
        Self {
            success: false,
            skipped: false,
            reason: Some(reason),
            notification_id: Some(id),
            external_id: None,
        }
    }
}

/// Build a notification row from params.
///
/// Used by [`Dispatcher::create`] and by the domain sweeps, which insert
/// the row inside their own transaction before sending.
pub fn notification_from_params(params: &NotificationParams, now: DateTime<Utc>) -> Notification {
    let status = match params.scheduled_for {
        Some(at) if at > now => NotificationStatus::Pending,
        _ => NotificationStatus::Queued,
    };

    Notification {
        id: Uuid::new_v4(),
        organization_id: params.organization_id,
        member_id: params.member_id,
        kind: params.kind,
        channel: params.channel,
        priority: params.priority,
        title: params.title.clone(),
        body: params.body.clone(),
        action_url: params.action_url.clone(),
        recipient: params.recipient.clone(),
        status,
        retry_count: 0,
        external_id: None,
        failure_reason: None,
        scheduled_for: params.scheduled_for,
        sent_at: None,
        last_retry_at: None,
        next_retry_at: None,
        is_read: false,
        read_at: None,
        is_dismissed: false,
        created_at: now,
    }
}

/// Routes approved notifications to the correct channel adapter and
/// records delivery state.
#[derive(Debug)]
pub struct Dispatcher {
    /// Notification row persistence.
    pub(crate) store: Arc<dyn NotificationStore>,
    /// Preference resolution rules.
    resolver: PreferenceResolver,
    /// Email provider.
    email: Arc<dyn EmailSender>,
    /// SMS gateway.
    sms: Arc<dyn SmsSender>,
    /// Engine configuration.
    pub(crate) config: NotifyConfig,
}

impl Dispatcher {
    /// Create a new dispatcher.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        resolver: PreferenceResolver,
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
        config: NotifyConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            email,
            sms,
            config,
        }
    }

    /// The preference resolver, for callers that need to pre-check a send
    /// inside their own transaction.
    pub fn resolver(&self) -> &PreferenceResolver {
        &self.resolver
    }

    /// Create a notification: resolve preferences, persist, and send
    /// unless scheduled for later.
    ///
    /// A preference veto returns a skipped result without persisting a
    /// row; skips are logged, not stored.
    pub async fn create(&self, params: NotificationParams) -> AppResult<SendResult> {
        params
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid notification params: {e}")))?;

        let decision = self
            .resolver
            .should_send(
                params.organization_id,
                params.member_id,
                params.kind,
                params.channel,
                params.priority,
            )
            .await?;

        if !decision.send {
            let reason = decision
                .reason
                .unwrap_or_else(|| "suppressed by preferences".to_string());
            tracing::info!(
                kind = %params.kind,
                channel = %params.channel,
                %reason,
                "Notification skipped"
            );
            return Ok(SendResult::skipped(reason));
        }

        let now = Utc::now();
        let row = notification_from_params(&params, now);
        self.store.insert(&row).await?;

        if row.status == NotificationStatus::Pending {
            tracing::debug!(id = %row.id, scheduled_for = ?row.scheduled_for, "Notification scheduled");
            return Ok(SendResult::scheduled(row.id));
        }

        self.send(row.id).await
    }

    /// Attempt delivery of a persisted notification.
    ///
    /// On success the row moves to SENT with the provider message id; on
    /// failure it moves to FAILED with the retry bookkeeping updated. The
    /// channel error is swallowed here and reflected in the result.
    pub async fn send(&self, id: Uuid) -> AppResult<SendResult> {
        let notification = self.store.fetch(id).await?;

        if notification.status == NotificationStatus::Sent {
            return Ok(SendResult::sent(id, notification.external_id));
        }

        if notification.status == NotificationStatus::Pending {
            self.store.mark_queued(id).await?;
        }

        match self.attempt(&notification).await {
            Ok(external_id) => {
                self.store
                    .mark_sent(id, external_id.as_deref(), Utc::now())
                    .await?;
                tracing::info!(
                    id = %id,
                    channel = %notification.channel,
                    kind = %notification.kind,
                    "Notification sent"
                );
                Ok(SendResult::sent(id, external_id))
            }
            Err(e) => {
                let reason = e.to_string();
                let retry_count = notification.retry_count + 1;
                let next_retry_at = if (retry_count as u32) < self.config.max_retries {
                    Some(
                        Utc::now()
                            + backoff::retry_backoff(
                                self.config.retry_base_seconds,
                                retry_count as u32,
                            ),
                    )
                } else {
                    None
                };
                self.store
                    .mark_failed(id, &reason, retry_count, next_retry_at)
                    .await?;
                tracing::warn!(
                    id = %id,
                    channel = %notification.channel,
                    retry_count,
                    terminal = next_retry_at.is_none(),
                    %reason,
                    "Notification send failed"
                );
                Ok(SendResult::failed(id, reason))
            }
        }
    }

    /// One channel attempt. Returns the provider message id, if any.
    async fn attempt(&self, notification: &Notification) -> AppResult<Option<String>> {
        match notification.channel {
            NotificationChannel::Email => {
                let to = notification.recipient.as_deref().ok_or_else(|| {
                    AppError::validation("email notification has no recipient address")
                })?;
                let html = template::render_email(
                    &notification.title,
                    &notification.body,
                    notification.action_url.as_deref(),
                    &self.config.portal_base_url,
                );
                let message = EmailMessage {
                    from: format!("{} <{}>", self.config.from_name, self.config.from_address),
                    to: to.to_string(),
                    subject: notification.title.clone(),
                    html,
                };
                let id = self.email.send(&message).await?;
                Ok(Some(id))
            }
            NotificationChannel::Sms => {
                let to = notification.recipient.as_deref().ok_or_else(|| {
                    AppError::validation("sms notification has no recipient phone number")
                })?;
                let id = self.sms.send(to, &notification.body).await?;
                Ok(Some(id))
            }
            // The stored row is the deliverable.
            NotificationChannel::InApp => Ok(None),
            NotificationChannel::Push => {
                tracing::debug!(id = %notification.id, "Push channel is a stub; recording as delivered");
                Ok(None)
            }
        }
    }
}
