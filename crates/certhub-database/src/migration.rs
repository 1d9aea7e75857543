//! Embedded migration runner.

use sqlx::PgPool;
use tracing::info;

use certhub_core::error::{AppError, ErrorKind};

/// Apply any pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to run migrations", e))?;

    info!("Database migrations up to date");
    Ok(())
}
