//! Notification preference repository implementation.
//!
//! Serves the engine's read-only [`PreferenceStore`] view and the
//! settings endpoints that own the records.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::notification::{
    OrganizationNotificationPreference, UserNotificationPreference,
};
use certhub_notify::PreferenceStore;

/// Repository for user and organization notification preferences.
#[derive(Debug, Clone)]
pub struct PreferenceRepository {
    pool: PgPool,
}

impl PreferenceRepository {
    /// Create a new preference repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Organization preferences, lazily created with allow-all defaults
    /// on first read. Used by the settings endpoint; the engine's store
    /// view never creates rows.
    pub async fn get_or_create_organization(
        &self,
        organization_id: Uuid,
    ) -> AppResult<OrganizationNotificationPreference> {
        if let Some(existing) = self.find_organization(organization_id).await? {
            return Ok(existing);
        }

        let defaults =
            OrganizationNotificationPreference::default_for_organization(organization_id);
        self.upsert_organization(&defaults).await?;
        Ok(defaults)
    }

    async fn find_organization(
        &self,
        organization_id: Uuid,
    ) -> AppResult<Option<OrganizationNotificationPreference>> {
        sqlx::query_as::<_, OrganizationNotificationPreference>(
            "SELECT * FROM organization_notification_preferences WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to load organization preferences",
                e,
            )
        })
    }

    /// Upsert the full organization preference record.
    pub async fn upsert_organization(
        &self,
        prefs: &OrganizationNotificationPreference,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO organization_notification_preferences \
             (organization_id, email_enabled, sms_enabled, \
              email_insurance, email_audit, email_corrective_action, email_document, \
              email_programme, email_credential, email_system, \
              sms_insurance, sms_audit, sms_corrective_action, sms_document, \
              sms_programme, sms_credential, sms_system, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, NOW()) \
             ON CONFLICT (organization_id) DO UPDATE SET \
              email_enabled = EXCLUDED.email_enabled, sms_enabled = EXCLUDED.sms_enabled, \
              email_insurance = EXCLUDED.email_insurance, email_audit = EXCLUDED.email_audit, \
              email_corrective_action = EXCLUDED.email_corrective_action, \
              email_document = EXCLUDED.email_document, email_programme = EXCLUDED.email_programme, \
              email_credential = EXCLUDED.email_credential, email_system = EXCLUDED.email_system, \
              sms_insurance = EXCLUDED.sms_insurance, sms_audit = EXCLUDED.sms_audit, \
              sms_corrective_action = EXCLUDED.sms_corrective_action, \
              sms_document = EXCLUDED.sms_document, sms_programme = EXCLUDED.sms_programme, \
              sms_credential = EXCLUDED.sms_credential, sms_system = EXCLUDED.sms_system, \
              updated_at = NOW()",
        )
        .bind(prefs.organization_id)
        .bind(prefs.email_enabled)
        .bind(prefs.sms_enabled)
        .bind(prefs.email_insurance)
        .bind(prefs.email_audit)
        .bind(prefs.email_corrective_action)
        .bind(prefs.email_document)
        .bind(prefs.email_programme)
        .bind(prefs.email_credential)
        .bind(prefs.email_system)
        .bind(prefs.sms_insurance)
        .bind(prefs.sms_audit)
        .bind(prefs.sms_corrective_action)
        .bind(prefs.sms_document)
        .bind(prefs.sms_programme)
        .bind(prefs.sms_credential)
        .bind(prefs.sms_system)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to save organization preferences",
                e,
            )
        })?;
        Ok(())
    }

    /// User preferences, or allow-all defaults when the member has not
    /// stored any.
    pub async fn get_user_or_defaults(
        &self,
        member_id: Uuid,
    ) -> AppResult<UserNotificationPreference> {
        Ok(self
            .find_user(member_id)
            .await?
            .unwrap_or_else(|| UserNotificationPreference::default_for_member(member_id)))
    }

    async fn find_user(&self, member_id: Uuid) -> AppResult<Option<UserNotificationPreference>> {
        sqlx::query_as::<_, UserNotificationPreference>(
            "SELECT * FROM user_notification_preferences WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load user preferences", e)
        })
    }

    /// Upsert the full user preference record.
    pub async fn upsert_user(&self, prefs: &UserNotificationPreference) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_notification_preferences \
             (member_id, email_enabled, sms_enabled, \
              email_insurance, email_audit, email_corrective_action, email_document, \
              email_programme, email_credential, email_system, \
              sms_insurance, sms_audit, sms_corrective_action, sms_document, \
              sms_programme, sms_credential, sms_system, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, NOW()) \
             ON CONFLICT (member_id) DO UPDATE SET \
              email_enabled = EXCLUDED.email_enabled, sms_enabled = EXCLUDED.sms_enabled, \
              email_insurance = EXCLUDED.email_insurance, email_audit = EXCLUDED.email_audit, \
              email_corrective_action = EXCLUDED.email_corrective_action, \
              email_document = EXCLUDED.email_document, email_programme = EXCLUDED.email_programme, \
              email_credential = EXCLUDED.email_credential, email_system = EXCLUDED.email_system, \
              sms_insurance = EXCLUDED.sms_insurance, sms_audit = EXCLUDED.sms_audit, \
              sms_corrective_action = EXCLUDED.sms_corrective_action, \
              sms_document = EXCLUDED.sms_document, sms_programme = EXCLUDED.sms_programme, \
              sms_credential = EXCLUDED.sms_credential, sms_system = EXCLUDED.sms_system, \
              updated_at = NOW()",
        )
        .bind(prefs.member_id)
        .bind(prefs.email_enabled)
        .bind(prefs.sms_enabled)
        .bind(prefs.email_insurance)
        .bind(prefs.email_audit)
        .bind(prefs.email_corrective_action)
        .bind(prefs.email_document)
        .bind(prefs.email_programme)
        .bind(prefs.email_credential)
        .bind(prefs.email_system)
        .bind(prefs.sms_insurance)
        .bind(prefs.sms_audit)
        .bind(prefs.sms_corrective_action)
        .bind(prefs.sms_document)
        .bind(prefs.sms_programme)
        .bind(prefs.sms_credential)
        .bind(prefs.sms_system)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to save user preferences", e)
        })?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for PreferenceRepository {
    async fn organization_preferences(
        &self,
        organization_id: Uuid,
    ) -> AppResult<Option<OrganizationNotificationPreference>> {
        self.find_organization(organization_id).await
    }

    async fn user_preferences(
        &self,
        member_id: Uuid,
    ) -> AppResult<Option<UserNotificationPreference>> {
        self.find_user(member_id).await
    }
}
