//! In-memory fakes shared by the engine's unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use certhub_core::config::notify::{EmailProviderConfig, NotifyConfig, SmsProviderConfig};
use certhub_core::{AppError, AppResult};
use certhub_entity::notification::{
    Notification, NotificationChannel, NotificationKind, NotificationPriority, NotificationStatus,
    OrganizationNotificationPreference, UserNotificationPreference,
};

use crate::channel::{EmailMessage, EmailSender, SmsSender};
use crate::dispatcher::{Dispatcher, NotificationParams};
use crate::resolver::PreferenceResolver;
use crate::store::{NotificationStore, PreferenceStore};

/// Mutex-backed notification store.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    rows: Mutex<HashMap<Uuid, Notification>>,
}

impl MemoryNotificationStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, id: Uuid) -> Notification {
        self.rows.lock().unwrap().get(&id).cloned().unwrap()
    }

    /// Seed a row directly, bypassing the dispatcher.
    pub fn put(&self, notification: Notification) {
        self.rows
            .lock()
            .unwrap()
            .insert(notification.id, notification);
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<()> {
        self.rows
            .lock()
            .unwrap()
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> AppResult<Notification> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    async fn mark_queued(&self, id: Uuid) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get_mut(&id) {
            row.status = NotificationStatus::Queued;
        }
        Ok(())
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        external_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get_mut(&id) {
            row.status = NotificationStatus::Sent;
            row.external_id = external_id.map(str::to_string);
            row.sent_at = Some(at);
            row.failure_reason = None;
            row.next_retry_at = None;
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        reason: &str,
        retry_count: i32,
        next_retry_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get_mut(&id) {
            row.status = NotificationStatus::Failed;
            row.failure_reason = Some(reason.to_string());
            row.retry_count = retry_count;
            row.next_retry_at = next_retry_at;
        }
        Ok(())
    }

    async fn mark_retrying(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get_mut(&id) {
            row.last_retry_at = Some(at);
        }
        Ok(())
    }

    async fn due_scheduled(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Notification>> {
        let rows = self.rows.lock().unwrap();
        let mut due: Vec<Notification> = rows
            .values()
            .filter(|n| {
                n.status == NotificationStatus::Pending
                    && n.scheduled_for.map(|at| at <= now).unwrap_or(false)
            })
            .cloned()
            .collect();
        due.sort_by_key(|n| n.scheduled_for);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn due_retries(
        &self,
        now: DateTime<Utc>,
        max_retries: u32,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let rows = self.rows.lock().unwrap();
        let mut due: Vec<Notification> = rows
            .values()
            .filter(|n| {
                n.status == NotificationStatus::Failed
                    && (n.retry_count as u32) < max_retries
                    && n.next_retry_at.map(|at| at <= now).unwrap_or(true)
            })
            .cloned()
            .collect();
        due.sort_by_key(|n| n.next_retry_at);
        due.truncate(limit as usize);
        Ok(due)
    }
}

/// Preference store backed by optional fixed records.
#[derive(Debug, Default)]
pub struct FakePreferences {
    pub organization: Option<OrganizationNotificationPreference>,
    pub user: Option<UserNotificationPreference>,
}

#[async_trait]
impl PreferenceStore for FakePreferences {
    async fn organization_preferences(
        &self,
        organization_id: Uuid,
    ) -> AppResult<Option<OrganizationNotificationPreference>> {
        Ok(self
            .organization
            .clone()
            .filter(|p| p.organization_id == organization_id))
    }

    async fn user_preferences(
        &self,
        member_id: Uuid,
    ) -> AppResult<Option<UserNotificationPreference>> {
        Ok(self.user.clone().filter(|p| p.member_id == member_id))
    }
}

/// Email sender that records messages, optionally refusing every send.
#[derive(Debug, Default)]
pub struct FakeEmail {
    pub fail: bool,
    messages: Mutex<Vec<EmailMessage>>,
}

impl FakeEmail {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for FakeEmail {
    async fn send(&self, message: &EmailMessage) -> AppResult<String> {
        if self.fail {
            return Err(AppError::provider("Email provider rejected the message"));
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(format!("email-{}", Uuid::new_v4()))
    }
}

/// SMS sender that records (phone, message) pairs.
#[derive(Debug, Default)]
pub struct FakeSms {
    pub fail: bool,
    messages: Mutex<Vec<(String, String)>>,
}

impl FakeSms {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsSender for FakeSms {
    async fn send(&self, phone: &str, message: &str) -> AppResult<String> {
        if self.fail {
            return Err(AppError::provider("SMS gateway rejected the message"));
        }
        self.messages
            .lock()
            .unwrap()
            .push((phone.to_string(), message.to_string()));
        Ok(format!("sms-{}", Uuid::new_v4()))
    }
}

pub fn test_config() -> NotifyConfig {
    NotifyConfig {
        from_address: "alerts@certhub.example".to_string(),
        from_name: "CertHub".to_string(),
        portal_base_url: "https://portal.certhub.example".to_string(),
        email: EmailProviderConfig {
            api_url: "https://mail.invalid/send".to_string(),
            api_key: "test".to_string(),
            timeout_seconds: 5,
        },
        sms: SmsProviderConfig {
            api_url: "https://sms.invalid/send".to_string(),
            api_key: "test".to_string(),
            sender_id: "CertHub".to_string(),
            timeout_seconds: 5,
        },
        max_retries: 3,
        retry_base_seconds: 300,
        scheduled_batch_size: 100,
        retry_batch_size: 50,
    }
}

/// Build a dispatcher over fakes. Returns the email and SMS fakes so
/// tests can inspect what was sent.
pub fn test_dispatcher(
    store: Arc<MemoryNotificationStore>,
    organization: Option<OrganizationNotificationPreference>,
    user: Option<UserNotificationPreference>,
    email_fails: bool,
    sms_fails: bool,
) -> (Dispatcher, Arc<FakeEmail>, Arc<FakeSms>) {
    let email = Arc::new(FakeEmail {
        fail: email_fails,
        messages: Mutex::new(Vec::new()),
    });
    let sms = Arc::new(FakeSms {
        fail: sms_fails,
        messages: Mutex::new(Vec::new()),
    });
    let resolver = PreferenceResolver::new(Arc::new(FakePreferences { organization, user }));
    let dispatcher = Dispatcher::new(
        store,
        resolver,
        email.clone(),
        sms.clone(),
        test_config(),
    );
    (dispatcher, email, sms)
}

/// Baseline insurance-expiry params for the given channel.
pub fn test_params(channel: NotificationChannel) -> NotificationParams {
    NotificationParams {
        organization_id: None,
        member_id: None,
        kind: NotificationKind::InsuranceExpiring,
        channel,
        priority: NotificationPriority::Normal,
        title: "Policy expiring".to_string(),
        body: "Your public liability policy expires in 30 days.".to_string(),
        action_url: Some("https://portal.certhub.example/insurance".to_string()),
        recipient: Some("owner@example.org".to_string()),
        scheduled_for: None,
    }
}
