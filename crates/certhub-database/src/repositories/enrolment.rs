//! Programme enrolment repository implementation.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::compliance::{Enrolment, EnrolmentStatus};

/// Repository for programme enrolments, their renewal alert flags, and
/// the renewal status transition.
#[derive(Debug, Clone)]
pub struct EnrolmentRepository {
    pool: PgPool,
}

impl EnrolmentRepository {
    /// Create a new enrolment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active or renewal-due enrolments inside the outermost renewal
    /// window with at least one alert flag unset. The sweep decides which
    /// thresholds are newly crossed via
    /// [`Enrolment::due_renewal_thresholds`].
    pub async fn renewal_candidates(&self, now: DateTime<Utc>) -> AppResult<Vec<Enrolment>> {
        sqlx::query_as::<_, Enrolment>(
            "SELECT * FROM enrolments \
             WHERE status IN ('active', 'renewal_due') AND anniversary_date <= $1 \
             AND NOT (renewal_alert90_sent AND renewal_alert60_sent AND renewal_alert30_sent) \
             ORDER BY anniversary_date ASC",
        )
        .bind(now + Duration::days(90))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query renewal candidates", e)
        })
    }

    /// Flip one threshold's renewal alert flag inside the caller's
    /// transaction.
    pub async fn mark_renewal_alert_sent(
        conn: &mut PgConnection,
        id: Uuid,
        threshold_days: i64,
    ) -> AppResult<()> {
        let column = match threshold_days {
            90 => "renewal_alert90_sent",
            60 => "renewal_alert60_sent",
            30 => "renewal_alert30_sent",
            other => {
                return Err(AppError::internal(format!(
                    "Unknown renewal alert threshold: {other}"
                )))
            }
        };

        sqlx::query(&format!(
            "UPDATE enrolments SET {column} = TRUE, updated_at = NOW() WHERE id = $1"
        ))
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update renewal alert flag", e)
        })?;
        Ok(())
    }

    /// Update an enrolment's status inside the caller's transaction.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: EnrolmentStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE enrolments SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update enrolment status", e)
            })?;
        Ok(())
    }
}
