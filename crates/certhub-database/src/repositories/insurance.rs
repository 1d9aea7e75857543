//! Insurance policy repository implementation.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::compliance::InsurancePolicy;

/// Repository for insurance policies and their expiry alert flags.
#[derive(Debug, Clone)]
pub struct InsurancePolicyRepository {
    pool: PgPool,
}

impl InsurancePolicyRepository {
    /// Create a new insurance policy repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Policies near an expiry threshold whose alert-sent flags are not
    /// all set. The expiry sweep narrows to the exact day band and flag
    /// per threshold in memory.
    pub async fn expiry_candidates(&self, now: DateTime<Utc>) -> AppResult<Vec<InsurancePolicy>> {
        sqlx::query_as::<_, InsurancePolicy>(
            "SELECT * FROM insurance_policies \
             WHERE expiry_date > $1 AND expiry_date <= $2 \
             AND NOT (alert90_sent AND alert60_sent AND alert30_sent) \
             ORDER BY expiry_date ASC",
        )
        .bind(now)
        .bind(now + Duration::days(91))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query expiring policies", e)
        })
    }

    /// Flip one threshold's alert-sent flag inside the caller's
    /// transaction.
    pub async fn mark_alert_sent(
        conn: &mut PgConnection,
        id: Uuid,
        threshold_days: i64,
    ) -> AppResult<()> {
        let column = match threshold_days {
            90 => "alert90_sent",
            60 => "alert60_sent",
            30 => "alert30_sent",
            other => {
                return Err(AppError::internal(format!(
                    "Unknown insurance alert threshold: {other}"
                )))
            }
        };

        sqlx::query(&format!(
            "UPDATE insurance_policies SET {column} = TRUE, updated_at = NOW() WHERE id = $1"
        ))
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update alert flag", e)
        })?;
        Ok(())
    }
}
