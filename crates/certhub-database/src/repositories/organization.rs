//! Organization repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::directory::Organization;

/// Repository for member organizations.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    /// Create a new organization repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load an organization by id.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Organization> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load organization", e)
            })?
            .ok_or_else(|| AppError::not_found(format!("Organization {id} not found")))
    }
}
