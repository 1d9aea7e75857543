//! Programme renewal sweep.
//!
//! Unlike the expiry sweeps, renewal thresholds catch up: an enrolment
//! that has not been swept for a while can have 90, 60, and 30 all newly
//! crossed at once, and every one of them fires in the same pass. All
//! notification rows, all flag flips, and the ACTIVE -> RENEWAL_DUE
//! transition for one enrolment commit in a single transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::compliance::{Enrolment, EnrolmentStatus};
use certhub_entity::directory::Organization;
use certhub_entity::notification::{
    NotificationChannel, NotificationKind, NotificationPriority,
};
use certhub_notify::dispatcher::notification_from_params;
use certhub_notify::{Dispatcher, NotificationParams};

use certhub_database::repositories::{
    EnrolmentRepository, NotificationRepository, OrganizationRepository,
};

use crate::job::SweepJob;
use crate::jobs::ENROLMENT_SWEEP;

/// Sweeps programme enrolments for renewal anniversary thresholds.
#[derive(Debug)]
pub struct ProgrammeRenewalJob {
    pool: PgPool,
    enrolments: EnrolmentRepository,
    organizations: OrganizationRepository,
    dispatcher: Arc<Dispatcher>,
    portal_base_url: String,
}

impl ProgrammeRenewalJob {
    /// Create a new programme renewal sweep.
    pub fn new(pool: PgPool, dispatcher: Arc<Dispatcher>, portal_base_url: String) -> Self {
        Self {
            enrolments: EnrolmentRepository::new(pool.clone()),
            organizations: OrganizationRepository::new(pool.clone()),
            pool,
            dispatcher,
            portal_base_url,
        }
    }

    /// Process every newly crossed threshold for one enrolment in a
    /// single transaction. Returns the ids of the rows to send.
    async fn process(
        &self,
        enrolment: &Enrolment,
        organization: &Organization,
        thresholds: &[i64],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        let decision = self
            .dispatcher
            .resolver()
            .should_send(
                Some(organization.id),
                None,
                NotificationKind::ProgrammeRenewalDue,
                NotificationChannel::Email,
                NotificationPriority::High,
            )
            .await?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let mut notification_ids = Vec::new();
        for &threshold in thresholds {
            if decision.send {
                let (title, body) = renewal_message(enrolment, threshold);
                let params = NotificationParams {
                    organization_id: Some(organization.id),
                    member_id: None,
                    kind: NotificationKind::ProgrammeRenewalDue,
                    channel: NotificationChannel::Email,
                    priority: NotificationPriority::High,
                    title,
                    body,
                    action_url: Some(format!("{}/programmes", self.portal_base_url)),
                    recipient: Some(organization.contact_email.clone()),
                    scheduled_for: None,
                };
                let row = notification_from_params(&params, now);
                NotificationRepository::insert_in_tx(&mut *tx, &row).await?;
                notification_ids.push(row.id);
            }
            EnrolmentRepository::mark_renewal_alert_sent(&mut *tx, enrolment.id, threshold)
                .await?;
        }

        if enrolment.status == EnrolmentStatus::Active {
            EnrolmentRepository::set_status(&mut *tx, enrolment.id, EnrolmentStatus::RenewalDue)
                .await?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to commit renewal transaction",
                e,
            )
        })?;

        if !decision.send {
            tracing::info!(
                enrolment = %enrolment.id,
                reason = decision.reason.as_deref().unwrap_or(""),
                "Renewal alerts suppressed by preferences"
            );
        }
        Ok(notification_ids)
    }
}

#[async_trait]
impl SweepJob for ProgrammeRenewalJob {
    fn name(&self) -> &str {
        ENROLMENT_SWEEP
    }

    async fn run(&self, now: DateTime<Utc>) -> AppResult<Value> {
        let candidates = self.enrolments.renewal_candidates(now).await?;
        let mut sent = 0usize;
        let mut thresholds_fired = 0usize;
        let mut errors = 0usize;

        for enrolment in &candidates {
            let thresholds = enrolment.due_renewal_thresholds(now);
            if thresholds.is_empty() {
                continue;
            }

            let organization = match self.organizations.find_by_id(enrolment.organization_id).await
            {
                Ok(org) => org,
                Err(e) => {
                    errors += 1;
                    tracing::error!(enrolment = %enrolment.id, error = %e, "Owner lookup failed");
                    continue;
                }
            };

            match self.process(enrolment, &organization, &thresholds, now).await {
                Ok(ids) => {
                    thresholds_fired += thresholds.len();
                    for id in ids {
                        match self.dispatcher.send(id).await {
                            Ok(result) if result.success => sent += 1,
                            Ok(_) => {}
                            Err(e) => {
                                tracing::error!(notification = %id, error = %e, "Renewal send errored");
                            }
                        }
                    }
                }
                Err(e) => {
                    errors += 1;
                    tracing::error!(
                        enrolment = %enrolment.id,
                        error = %e,
                        "Renewal transaction failed; flags left unset"
                    );
                }
            }
        }

        Ok(serde_json::json!({
            "candidates": candidates.len(),
            "thresholds_fired": thresholds_fired,
            "sent": sent,
            "errors": errors,
        }))
    }
}

fn renewal_message(enrolment: &Enrolment, threshold: i64) -> (String, String) {
    let title = format!("{} renewal due in {} days", enrolment.programme, threshold);
    let body = format!(
        "Your {} enrolment is due for renewal on {}, {} days from now.\n\n\
         Complete the renewal declaration before the anniversary date to \
         keep your certification active.",
        enrolment.programme,
        enrolment.anniversary_date.format("%-d %B %Y"),
        threshold,
    );
    (title, body)
}
