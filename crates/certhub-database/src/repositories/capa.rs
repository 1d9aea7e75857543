//! Corrective action repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::compliance::CorrectiveAction;

/// Repository for corrective actions and the overdue alert flag.
#[derive(Debug, Clone)]
pub struct CorrectiveActionRepository {
    pool: PgPool,
}

impl CorrectiveActionRepository {
    /// Create a new corrective action repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open actions past their due date that have not been alerted yet.
    pub async fn overdue_unalerted(&self, now: DateTime<Utc>) -> AppResult<Vec<CorrectiveAction>> {
        sqlx::query_as::<_, CorrectiveAction>(
            "SELECT * FROM corrective_actions \
             WHERE due_date < $1 AND status <> 'closed' AND overdue_alert_sent = FALSE \
             ORDER BY due_date ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query overdue actions", e)
        })
    }

    /// Flip the overdue alert flag inside the caller's transaction.
    pub async fn mark_overdue_alert_sent(conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE corrective_actions SET overdue_alert_sent = TRUE, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update overdue alert flag", e)
        })?;
        Ok(())
    }
}
