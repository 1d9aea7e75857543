//! Notification repository implementation.
//!
//! Doubles as the Postgres [`NotificationStore`] used by the dispatch
//! engine, and carries the in-app surface (list, unread count, read and
//! dismiss state) consumed by the API handlers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_core::types::pagination::{PageRequest, PageResponse};
use certhub_entity::notification::Notification;
use certhub_notify::NotificationStore;

const INSERT_SQL: &str = "INSERT INTO notifications \
     (id, organization_id, member_id, kind, channel, priority, title, body, action_url, \
      recipient, status, retry_count, external_id, failure_reason, scheduled_for, sent_at, \
      last_retry_at, next_retry_at, is_read, read_at, is_dismissed, created_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
      $18, $19, $20, $21, $22)";

/// Repository for notification rows.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a notification row inside the caller's transaction.
    ///
    /// The domain sweeps use this so the row commits or rolls back
    /// together with the alert-sent flag update.
    pub async fn insert_in_tx(
        conn: &mut PgConnection,
        notification: &Notification,
    ) -> AppResult<()> {
        bind_insert(sqlx::query(INSERT_SQL), notification)
            .execute(conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert notification", e)
            })?;
        Ok(())
    }

    /// List a member's in-app notifications, newest first, excluding
    /// dismissed rows.
    pub async fn find_in_app_for_member(
        &self,
        member_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE member_id = $1 AND channel = 'in_app' AND is_dismissed = FALSE",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
        })?;

        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE member_id = $1 AND channel = 'in_app' AND is_dismissed = FALSE \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(member_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list notifications", e)
        })?;

        Ok(PageResponse::new(
            notifications,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Count a member's unread in-app notifications.
    pub async fn count_unread(&self, member_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE member_id = $1 AND channel = 'in_app' AND is_read = FALSE \
             AND is_dismissed = FALSE",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))
    }

    /// Mark one notification read. Scoped to the owning member.
    pub async fn mark_read(&self, id: Uuid, member_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() \
             WHERE id = $1 AND member_id = $2",
        )
        .bind(id)
        .bind(member_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        }
        Ok(())
    }

    /// Mark all of a member's notifications read. Returns the number
    /// updated.
    pub async fn mark_all_read(&self, member_id: Uuid) -> AppResult<i64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() \
             WHERE member_id = $1 AND channel = 'in_app' AND is_read = FALSE",
        )
        .bind(member_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;
        Ok(result.rows_affected() as i64)
    }

    /// Dismiss a notification from the in-app feed. The row is kept.
    pub async fn dismiss(&self, id: Uuid, member_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET is_dismissed = TRUE WHERE id = $1 AND member_id = $2",
        )
        .bind(id)
        .bind(member_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to dismiss", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        }
        Ok(())
    }
}

fn bind_insert<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    n: &'q Notification,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(n.id)
        .bind(n.organization_id)
        .bind(n.member_id)
        .bind(n.kind)
        .bind(n.channel)
        .bind(n.priority)
        .bind(&n.title)
        .bind(&n.body)
        .bind(&n.action_url)
        .bind(&n.recipient)
        .bind(n.status)
        .bind(n.retry_count)
        .bind(&n.external_id)
        .bind(&n.failure_reason)
        .bind(n.scheduled_for)
        .bind(n.sent_at)
        .bind(n.last_retry_at)
        .bind(n.next_retry_at)
        .bind(n.is_read)
        .bind(n.read_at)
        .bind(n.is_dismissed)
        .bind(n.created_at)
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert(&self, notification: &Notification) -> AppResult<()> {
        bind_insert(sqlx::query(INSERT_SQL), notification)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert notification", e)
            })?;
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to fetch notification", e)
            })?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    async fn mark_queued(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE notifications SET status = 'queued' WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark queued", e))?;
        Ok(())
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        external_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE notifications SET status = 'sent', external_id = $2, sent_at = $3, \
             failure_reason = NULL, next_retry_at = NULL WHERE id = $1",
        )
        .bind(id)
        .bind(external_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark sent", e))?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        reason: &str,
        retry_count: i32,
        next_retry_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE notifications SET status = 'failed', failure_reason = $2, \
             retry_count = $3, next_retry_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(reason)
        .bind(retry_count)
        .bind(next_retry_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark failed", e))?;
        Ok(())
    }

    async fn mark_retrying(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE notifications SET last_retry_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to stamp retry", e)
            })?;
        Ok(())
    }

    async fn due_scheduled(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE status = 'pending' AND scheduled_for <= $1 \
             ORDER BY scheduled_for ASC LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query due scheduled", e)
        })
    }

    async fn due_retries(
        &self,
        now: DateTime<Utc>,
        max_retries: u32,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE status = 'failed' AND retry_count < $2 \
             AND (next_retry_at IS NULL OR next_retry_at <= $1) \
             ORDER BY next_retry_at ASC NULLS FIRST LIMIT $3",
        )
        .bind(now)
        .bind(max_retries as i32)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to query due retries", e))
    }
}
