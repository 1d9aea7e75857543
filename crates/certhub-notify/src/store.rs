//! Persistence traits the engine depends on.
//!
//! Defined on the consumer side so the engine can be exercised against
//! in-memory fakes; `certhub-database` provides the Postgres
//! implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use certhub_core::AppResult;
use certhub_entity::notification::{
    Notification, OrganizationNotificationPreference, UserNotificationPreference,
};

/// Notification row persistence as seen by the dispatcher and sweeps.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug {
    /// Persist a new notification row.
    async fn insert(&self, notification: &Notification) -> AppResult<()>;

    /// Load a notification by id.
    async fn fetch(&self, id: Uuid) -> AppResult<Notification>;

    /// Transition a pending notification to queued.
    async fn mark_queued(&self, id: Uuid) -> AppResult<()>;

    /// Record a successful send.
    async fn mark_sent(
        &self,
        id: Uuid,
        external_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Record a failed attempt with the updated retry bookkeeping.
    /// `next_retry_at` is `None` once the retry budget is exhausted.
    async fn mark_failed(
        &self,
        id: Uuid,
        reason: &str,
        retry_count: i32,
        next_retry_at: Option<DateTime<Utc>>,
    ) -> AppResult<()>;

    /// Stamp the start of a retry attempt.
    async fn mark_retrying(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Pending notifications whose scheduled time has elapsed, oldest
    /// first, up to `limit`.
    async fn due_scheduled(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Notification>>;

    /// Failed notifications with retry budget remaining whose next retry
    /// time is unset or has elapsed, up to `limit`.
    async fn due_retries(
        &self,
        now: DateTime<Utc>,
        max_retries: u32,
        limit: i64,
    ) -> AppResult<Vec<Notification>>;
}

/// Read access to stored notification preferences.
///
/// Both lookups return `None` when no record exists; absence always
/// defaults to allow.
#[async_trait]
pub trait PreferenceStore: Send + Sync + std::fmt::Debug {
    /// Organization-level preferences, if configured.
    async fn organization_preferences(
        &self,
        organization_id: Uuid,
    ) -> AppResult<Option<OrganizationNotificationPreference>>;

    /// Member-level preferences, if configured.
    async fn user_preferences(
        &self,
        member_id: Uuid,
    ) -> AppResult<Option<UserNotificationPreference>>;
}
