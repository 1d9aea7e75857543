//! Shared fixtures for the database-backed tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use sqlx::PgPool;
use uuid::Uuid;

use certhub_core::config::notify::{EmailProviderConfig, NotifyConfig, SmsProviderConfig};
use certhub_core::{AppError, AppResult};
use certhub_entity::compliance::{EnrolmentStatus, PolicyType};
use certhub_notify::channel::{EmailMessage, EmailSender, SmsSender};
use certhub_notify::{Dispatcher, PreferenceResolver};
use certhub_database::repositories::{NotificationRepository, PreferenceRepository};

static SWEEP_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Sweeps scan the whole table, so tests that run one must not overlap.
pub async fn sweep_lock() -> MutexGuard<'static, ()> {
    SWEEP_LOCK.lock().await
}

/// Connect to the test database named by `CERTHUB_TEST_DATABASE_URL`,
/// or `None` when the variable is unset.
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("CERTHUB_TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");
    certhub_database::migration::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Some(pool)
}

/// Email provider that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingEmail {
    pub messages: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, message: &EmailMessage) -> AppResult<String> {
        self.messages
            .lock()
            .expect("email mutex poisoned")
            .push(message.clone());
        Ok(format!("email-{}", Uuid::new_v4()))
    }
}

/// SMS gateway that records (phone, body) pairs.
#[derive(Debug, Default)]
pub struct RecordingSms {
    pub messages: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, phone_number: &str, message: &str) -> AppResult<String> {
        self.messages
            .lock()
            .expect("sms mutex poisoned")
            .push((phone_number.to_string(), message.to_string()));
        Ok(format!("sms-{}", Uuid::new_v4()))
    }
}

/// Email provider that refuses every message.
#[derive(Debug, Default)]
pub struct RejectingEmail;

#[async_trait]
impl EmailSender for RejectingEmail {
    async fn send(&self, _message: &EmailMessage) -> AppResult<String> {
        Err(AppError::provider("Email provider rejected the message"))
    }
}

pub fn notify_config() -> NotifyConfig {
    NotifyConfig {
        from_address: "no-reply@certhub.test".to_string(),
        from_name: "CertHub".to_string(),
        portal_base_url: "https://portal.certhub.test".to_string(),
        email: EmailProviderConfig {
            api_url: "http://localhost/unused".to_string(),
            api_key: String::new(),
            timeout_seconds: 1,
        },
        sms: SmsProviderConfig {
            api_url: "http://localhost/unused".to_string(),
            api_key: String::new(),
            sender_id: "CertHub".to_string(),
            timeout_seconds: 1,
        },
        max_retries: 3,
        retry_base_seconds: 300,
        scheduled_batch_size: 100,
        retry_batch_size: 50,
    }
}

/// Dispatcher wired to the Postgres repositories and recording providers.
pub fn build_dispatcher(pool: &PgPool) -> (Arc<Dispatcher>, Arc<RecordingEmail>, Arc<RecordingSms>) {
    let email = Arc::new(RecordingEmail::default());
    let sms = Arc::new(RecordingSms::default());
    let resolver = PreferenceResolver::new(Arc::new(PreferenceRepository::new(pool.clone())));
    let dispatcher = Dispatcher::new(
        Arc::new(NotificationRepository::new(pool.clone())),
        resolver,
        email.clone(),
        sms.clone(),
        notify_config(),
    );
    (Arc::new(dispatcher), email, sms)
}

/// Dispatcher whose email channel fails every attempt.
pub fn build_rejecting_dispatcher(pool: &PgPool) -> Arc<Dispatcher> {
    let resolver = PreferenceResolver::new(Arc::new(PreferenceRepository::new(pool.clone())));
    let dispatcher = Dispatcher::new(
        Arc::new(NotificationRepository::new(pool.clone())),
        resolver,
        Arc::new(RejectingEmail),
        Arc::new(RecordingSms::default()),
        notify_config(),
    );
    Arc::new(dispatcher)
}

/// Insert an organization with a unique name and return its id.
pub async fn create_organization(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO organizations (id, name, contact_name, contact_email, contact_phone)
         VALUES ($1, $2, 'Ana Ngata', $3, '+64211234567')",
    )
    .bind(id)
    .bind(format!("Test Org {id}"))
    .bind(format!("owner-{id}@example.org"))
    .execute(pool)
    .await
    .expect("Failed to insert organization");
    id
}

/// Insert a member of the given organization and return its id.
pub async fn create_member(pool: &PgPool, organization_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO members (id, organization_id, full_name, email, phone)
         VALUES ($1, $2, 'Tane Rameka', $3, '+64219876543')",
    )
    .bind(id)
    .bind(organization_id)
    .bind(format!("member-{id}@example.org"))
    .execute(pool)
    .await
    .expect("Failed to insert member");
    id
}

/// Insert an insurance policy expiring `days_out` days from now, with all
/// alert flags clear.
pub async fn create_policy(pool: &PgPool, organization_id: Uuid, days_out: i64) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO insurance_policies
             (id, organization_id, policy_type, insurer, policy_number, expiry_date)
         VALUES ($1, $2, $3, 'Vero', $4, $5)",
    )
    .bind(id)
    .bind(organization_id)
    .bind(PolicyType::PublicLiability)
    .bind(format!("PL-{}", &id.to_string()[..8]))
    .bind(Utc::now() + Duration::days(days_out))
    .execute(pool)
    .await
    .expect("Failed to insert policy");
    id
}

/// Insert an active enrolment whose anniversary is `days_out` days away.
pub async fn create_enrolment(pool: &PgPool, organization_id: Uuid, days_out: i64) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO enrolments (id, organization_id, programme, status, anniversary_date)
         VALUES ($1, $2, 'Site Safe', $3, $4)",
    )
    .bind(id)
    .bind(organization_id)
    .bind(EnrolmentStatus::Active)
    .bind(Utc::now() + Duration::days(days_out))
    .execute(pool)
    .await
    .expect("Failed to insert enrolment");
    id
}

pub async fn policy_flags(pool: &PgPool, id: Uuid) -> (bool, bool, bool) {
    sqlx::query_as(
        "SELECT alert90_sent, alert60_sent, alert30_sent FROM insurance_policies WHERE id = $1",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .expect("Failed to read policy flags")
}

pub async fn enrolment_state(pool: &PgPool, id: Uuid) -> (EnrolmentStatus, bool, bool, bool) {
    sqlx::query_as(
        "SELECT status, renewal_alert90_sent, renewal_alert60_sent, renewal_alert30_sent
         FROM enrolments WHERE id = $1",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .expect("Failed to read enrolment")
}

/// Count notification rows for one organization and kind.
pub async fn notification_count(pool: &PgPool, organization_id: Uuid, kind: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM notifications
         WHERE organization_id = $1 AND kind::text = $2",
    )
    .bind(organization_id)
    .bind(kind)
    .fetch_one(pool)
    .await
    .expect("Failed to count notifications");
    count
}
