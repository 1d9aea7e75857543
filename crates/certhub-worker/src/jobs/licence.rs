//! Practitioner licence status sweep.
//!
//! Compares each mirrored licence against the status it was last
//! notified on. A change fans out to the licence holder (email and SMS)
//! and the organization owner (email); the watermark update commits with
//! the fan-out rows so the change is reported exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::compliance::PractitionerLicence;
use certhub_entity::directory::{Member, Organization};
use certhub_entity::notification::{
    NotificationChannel, NotificationKind, NotificationPriority,
};
use certhub_notify::dispatcher::notification_from_params;
use certhub_notify::{Dispatcher, NotificationParams};

use certhub_database::repositories::{
    LicenceRepository, MemberRepository, NotificationRepository, OrganizationRepository,
};

use crate::job::SweepJob;
use crate::jobs::LICENCE_SWEEP;

/// Sweeps practitioner licences for register status changes.
#[derive(Debug)]
pub struct LicenceStatusJob {
    pool: PgPool,
    licences: LicenceRepository,
    organizations: OrganizationRepository,
    members: MemberRepository,
    dispatcher: Arc<Dispatcher>,
    portal_base_url: String,
}

impl LicenceStatusJob {
    /// Create a new licence status sweep.
    pub fn new(pool: PgPool, dispatcher: Arc<Dispatcher>, portal_base_url: String) -> Self {
        Self {
            licences: LicenceRepository::new(pool.clone()),
            organizations: OrganizationRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            pool,
            dispatcher,
            portal_base_url,
        }
    }

    /// Licence status changes are always-critical: the resolver never
    /// vetoes them, so the fan-out is built unconditionally.
    fn fan_out(
        &self,
        licence: &PractitionerLicence,
        organization: &Organization,
        holder: &Member,
    ) -> Vec<NotificationParams> {
        let (title, body) = change_message(licence, holder);
        let action_url = format!("{}/licences", self.portal_base_url);
        let mut fan_out = vec![NotificationParams {
            organization_id: Some(organization.id),
            member_id: Some(holder.id),
            kind: NotificationKind::LicenceStatusChange,
            channel: NotificationChannel::Email,
            priority: NotificationPriority::Critical,
            title: title.clone(),
            body: body.clone(),
            action_url: Some(action_url.clone()),
            recipient: Some(holder.email.clone()),
            scheduled_for: None,
        }];

        if let Some(phone) = &holder.phone {
            fan_out.push(NotificationParams {
                organization_id: Some(organization.id),
                member_id: Some(holder.id),
                kind: NotificationKind::LicenceStatusChange,
                channel: NotificationChannel::Sms,
                priority: NotificationPriority::Critical,
                title: title.clone(),
                body: format!(
                    "CertHub: licence {} is now {}. Check the portal for details.",
                    licence.licence_number,
                    licence.status.label()
                ),
                action_url: None,
                recipient: Some(phone.clone()),
                scheduled_for: None,
            });
        }

        fan_out.push(NotificationParams {
            organization_id: Some(organization.id),
            member_id: None,
            kind: NotificationKind::LicenceStatusChange,
            channel: NotificationChannel::Email,
            priority: NotificationPriority::Critical,
            title,
            body,
            action_url: Some(action_url),
            recipient: Some(organization.contact_email.clone()),
            scheduled_for: None,
        });

        fan_out
    }
}

#[async_trait]
impl SweepJob for LicenceStatusJob {
    fn name(&self) -> &str {
        LICENCE_SWEEP
    }

    async fn run(&self, now: DateTime<Utc>) -> AppResult<Value> {
        let changed = self.licences.changed_since_notified().await?;
        let mut sent = 0usize;
        let mut send_failures = 0usize;
        let mut errors = 0usize;

        for licence in &changed {
            let organization = match self.organizations.find_by_id(licence.organization_id).await
            {
                Ok(org) => org,
                Err(e) => {
                    errors += 1;
                    tracing::error!(licence = %licence.id, error = %e, "Owner lookup failed");
                    continue;
                }
            };
            let holder = match self.members.find_by_id(licence.member_id).await {
                Ok(member) => member,
                Err(e) => {
                    errors += 1;
                    tracing::error!(licence = %licence.id, error = %e, "Holder lookup failed");
                    continue;
                }
            };

            let fan_out = self.fan_out(licence, &organization, &holder);

            let result: AppResult<Vec<uuid::Uuid>> = async {
                let mut tx = self.pool.begin().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
                })?;
                let mut ids = Vec::new();
                for params in &fan_out {
                    let row = notification_from_params(params, now);
                    NotificationRepository::insert_in_tx(&mut *tx, &row).await?;
                    ids.push(row.id);
                }
                LicenceRepository::mark_status_notified(&mut *tx, licence.id, licence.status)
                    .await?;
                tx.commit().await.map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to commit licence transaction",
                        e,
                    )
                })?;
                Ok(ids)
            }
            .await;

            match result {
                Ok(ids) => {
                    for id in ids {
                        match self.dispatcher.send(id).await {
                            Ok(r) if r.success => sent += 1,
                            Ok(_) => send_failures += 1,
                            Err(e) => {
                                send_failures += 1;
                                tracing::error!(notification = %id, error = %e, "Licence send errored");
                            }
                        }
                    }
                }
                Err(e) => {
                    errors += 1;
                    tracing::error!(
                        licence = %licence.id,
                        error = %e,
                        "Licence transaction failed; watermark left unchanged"
                    );
                }
            }
        }

        Ok(serde_json::json!({
            "changed": changed.len(),
            "sent": sent,
            "send_failures": send_failures,
            "errors": errors,
        }))
    }
}

fn change_message(licence: &PractitionerLicence, holder: &Member) -> (String, String) {
    let title = format!(
        "Licence status change: {} is now {}",
        licence.licence_number,
        licence.status.label()
    );
    let body = format!(
        "The {} licence {} held by {} has changed from {} to {} on the \
         public register.\n\nIf this is unexpected, contact the registrar.",
        licence.licence_class,
        licence.licence_number,
        holder.full_name,
        licence.last_notified_status.label(),
        licence.status.label(),
    );
    (title, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use certhub_entity::compliance::LicenceStatus;
    use uuid::Uuid;

    #[test]
    fn test_message_names_both_statuses() {
        let now = Utc::now();
        let member_id = Uuid::new_v4();
        let licence = PractitionerLicence {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            member_id,
            licence_number: "BP-118242".to_string(),
            licence_class: "Carpentry".to_string(),
            status: LicenceStatus::Suspended,
            last_notified_status: LicenceStatus::Current,
            created_at: now,
            updated_at: now,
        };
        let holder = Member {
            id: member_id,
            organization_id: licence.organization_id,
            full_name: "Tane Rameka".to_string(),
            email: "tane@example.org".to_string(),
            phone: None,
            created_at: now,
        };

        let (title, body) = change_message(&licence, &holder);
        assert!(title.contains("Suspended"));
        assert!(body.contains("Current"));
        assert!(body.contains("Suspended"));
        assert!(body.contains("Tane Rameka"));
    }
}
