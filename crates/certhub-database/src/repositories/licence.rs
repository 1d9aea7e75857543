//! Practitioner licence repository implementation.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::compliance::{LicenceStatus, PractitionerLicence};

/// Repository for mirrored practitioner licences and the last-notified
/// status watermark.
#[derive(Debug, Clone)]
pub struct LicenceRepository {
    pool: PgPool,
}

impl LicenceRepository {
    /// Create a new licence repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Licences whose register status differs from the last status a
    /// change notification went out for.
    pub async fn changed_since_notified(&self) -> AppResult<Vec<PractitionerLicence>> {
        sqlx::query_as::<_, PractitionerLicence>(
            "SELECT * FROM practitioner_licences WHERE status <> last_notified_status \
             ORDER BY updated_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query changed licences", e)
        })
    }

    /// Record the status a change notification was sent for, inside the
    /// caller's transaction.
    pub async fn mark_status_notified(
        conn: &mut PgConnection,
        id: Uuid,
        status: LicenceStatus,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE practitioner_licences SET last_notified_status = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update notified status", e)
        })?;
        Ok(())
    }
}
