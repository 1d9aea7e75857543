//! Compliance document repository implementation.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::compliance::ComplianceDocument;

/// Repository for controlled documents and their review alert flags.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Create a new document repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Documents approaching their review date whose alert flags are not
    /// all set.
    pub async fn review_candidates(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ComplianceDocument>> {
        sqlx::query_as::<_, ComplianceDocument>(
            "SELECT * FROM compliance_documents \
             WHERE review_date > $1 AND review_date <= $2 \
             AND NOT (review_alert30_sent AND review_alert7_sent) \
             ORDER BY review_date ASC",
        )
        .bind(now)
        .bind(now + Duration::days(31))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query documents for review", e)
        })
    }

    /// Flip one threshold's review alert flag inside the caller's
    /// transaction.
    pub async fn mark_review_alert_sent(
        conn: &mut PgConnection,
        id: Uuid,
        threshold_days: i64,
    ) -> AppResult<()> {
        let column = match threshold_days {
            30 => "review_alert30_sent",
            7 => "review_alert7_sent",
            other => {
                return Err(AppError::internal(format!(
                    "Unknown document review threshold: {other}"
                )))
            }
        };

        sqlx::query(&format!(
            "UPDATE compliance_documents SET {column} = TRUE, updated_at = NOW() WHERE id = $1"
        ))
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update review alert flag", e)
        })?;
        Ok(())
    }
}
