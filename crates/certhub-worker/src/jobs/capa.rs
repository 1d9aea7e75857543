//! Overdue corrective action sweep.
//!
//! A direct condition check rather than a threshold window: any open
//! action past its due date that has not been alerted fans out to the
//! assignee (email and SMS) and the organization owner (email). The
//! fan-out rows and the overdue flag commit together; the sends after
//! commit are independent of each other.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::compliance::CorrectiveAction;
use certhub_entity::directory::{Member, Organization};
use certhub_entity::notification::{
    NotificationChannel, NotificationKind, NotificationPriority,
};
use certhub_notify::dispatcher::notification_from_params;
use certhub_notify::{Dispatcher, NotificationParams};

use certhub_database::repositories::{
    CorrectiveActionRepository, MemberRepository, NotificationRepository, OrganizationRepository,
};

use crate::job::SweepJob;
use crate::jobs::CAPA_SWEEP;

/// Sweeps corrective actions past their due date.
#[derive(Debug)]
pub struct OverdueCapaJob {
    pool: PgPool,
    actions: CorrectiveActionRepository,
    organizations: OrganizationRepository,
    members: MemberRepository,
    dispatcher: Arc<Dispatcher>,
    portal_base_url: String,
}

impl OverdueCapaJob {
    /// Create a new overdue corrective action sweep.
    pub fn new(pool: PgPool, dispatcher: Arc<Dispatcher>, portal_base_url: String) -> Self {
        Self {
            actions: CorrectiveActionRepository::new(pool.clone()),
            organizations: OrganizationRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            pool,
            dispatcher,
            portal_base_url,
        }
    }

    /// Build the fan-out params for one overdue action, applying
    /// preference decisions per recipient and channel.
    async fn fan_out(
        &self,
        action: &CorrectiveAction,
        organization: &Organization,
        assignee: Option<&Member>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<NotificationParams>> {
        let (title, body) = overdue_message(action, now);
        let action_url = format!("{}/corrective-actions", self.portal_base_url);
        let mut fan_out = Vec::new();

        if let Some(member) = assignee {
            let email = self
                .dispatcher
                .resolver()
                .should_send(
                    Some(organization.id),
                    Some(member.id),
                    NotificationKind::CapaOverdue,
                    NotificationChannel::Email,
                    NotificationPriority::High,
                )
                .await?;
            if email.send {
                fan_out.push(NotificationParams {
                    organization_id: Some(organization.id),
                    member_id: Some(member.id),
                    kind: NotificationKind::CapaOverdue,
                    channel: NotificationChannel::Email,
                    priority: NotificationPriority::High,
                    title: title.clone(),
                    body: body.clone(),
                    action_url: Some(action_url.clone()),
                    recipient: Some(member.email.clone()),
                    scheduled_for: None,
                });
            }

            if let Some(phone) = &member.phone {
                let sms = self
                    .dispatcher
                    .resolver()
                    .should_send(
                        Some(organization.id),
                        Some(member.id),
                        NotificationKind::CapaOverdue,
                        NotificationChannel::Sms,
                        NotificationPriority::High,
                    )
                    .await?;
                if sms.send {
                    fan_out.push(NotificationParams {
                        organization_id: Some(organization.id),
                        member_id: Some(member.id),
                        kind: NotificationKind::CapaOverdue,
                        channel: NotificationChannel::Sms,
                        priority: NotificationPriority::High,
                        title: title.clone(),
                        body: sms_body(action, now),
                        action_url: None,
                        recipient: Some(phone.clone()),
                        scheduled_for: None,
                    });
                }
            }
        }

        let org_email = self
            .dispatcher
            .resolver()
            .should_send(
                Some(organization.id),
                None,
                NotificationKind::CapaOverdue,
                NotificationChannel::Email,
                NotificationPriority::High,
            )
            .await?;
        if org_email.send {
            fan_out.push(NotificationParams {
                organization_id: Some(organization.id),
                member_id: None,
                kind: NotificationKind::CapaOverdue,
                channel: NotificationChannel::Email,
                priority: NotificationPriority::High,
                title,
                body,
                action_url: Some(action_url),
                recipient: Some(organization.contact_email.clone()),
                scheduled_for: None,
            });
        }

        Ok(fan_out)
    }
}

#[async_trait]
impl SweepJob for OverdueCapaJob {
    fn name(&self) -> &str {
        CAPA_SWEEP
    }

    async fn run(&self, now: DateTime<Utc>) -> AppResult<Value> {
        let overdue = self.actions.overdue_unalerted(now).await?;
        let mut sent = 0usize;
        let mut send_failures = 0usize;
        let mut errors = 0usize;

        for action in &overdue {
            let organization = match self.organizations.find_by_id(action.organization_id).await {
                Ok(org) => org,
                Err(e) => {
                    errors += 1;
                    tracing::error!(action = %action.id, error = %e, "Owner lookup failed");
                    continue;
                }
            };

            let assignee = match action.assignee_id {
                Some(member_id) => match self.members.find_by_id(member_id).await {
                    Ok(member) => Some(member),
                    Err(e) => {
                        tracing::warn!(
                            action = %action.id,
                            member = %member_id,
                            error = %e,
                            "Assignee lookup failed; alerting organization only"
                        );
                        None
                    }
                },
                None => None,
            };

            let fan_out = match self
                .fan_out(action, &organization, assignee.as_ref(), now)
                .await
            {
                Ok(fan_out) => fan_out,
                Err(e) => {
                    errors += 1;
                    tracing::error!(action = %action.id, error = %e, "Preference resolution failed");
                    continue;
                }
            };

            // One transaction per action covers every fan-out row plus
            // the flag.
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
                CorrectiveActionRepository::mark_overdue_alert_sent(&mut *tx, action.id).await?;
                tx.commit().await.map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to commit overdue transaction",
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
                                tracing::error!(notification = %id, error = %e, "Overdue send errored");
                            }
                        }
                    }
                }
                Err(e) => {
                    errors += 1;
                    tracing::error!(
                        action = %action.id,
                        error = %e,
                        "Overdue transaction failed; flag left unset"
                    );
                }
            }
        }

        Ok(serde_json::json!({
            "overdue": overdue.len(),
            "sent": sent,
            "send_failures": send_failures,
            "errors": errors,
        }))
    }
}

fn overdue_message(action: &CorrectiveAction, now: DateTime<Utc>) -> (String, String) {
    let days_overdue = (now - action.due_date).num_days().max(1);
    let title = format!("Corrective action overdue: {}", action.title);
    let body = format!(
        "\"{}\" was due on {} and is now {} days overdue.\n\n\
         Complete the action and record the close-out evidence.",
        action.title,
        action.due_date.format("%-d %B %Y"),
        days_overdue,
    );
    (title, body)
}

fn sms_body(action: &CorrectiveAction, now: DateTime<Utc>) -> String {
    let days_overdue = (now - action.due_date).num_days().max(1);
    format!(
        "CertHub: corrective action \"{}\" is {} days overdue. Please action it today.",
        action.title, days_overdue
    )
}
