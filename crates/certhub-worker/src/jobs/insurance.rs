//! Insurance expiry sweep.
//!
//! Scans policies approaching expiry at the 90/60/30-day thresholds and
//! alerts the organization owner once per threshold. The notification
//! row and the alert-sent flag commit in one transaction per alert so an
//! overlapping sweep can never double-send.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::compliance::{InsurancePolicy, EXPIRY_THRESHOLDS};
use certhub_entity::directory::Organization;
use certhub_entity::notification::{
    NotificationChannel, NotificationKind, NotificationPriority,
};
use certhub_notify::dispatcher::notification_from_params;
use certhub_notify::{Dispatcher, NotificationParams};

use certhub_database::repositories::{
    InsurancePolicyRepository, NotificationRepository, OrganizationRepository,
};

use crate::job::SweepJob;
use crate::jobs::INSURANCE_SWEEP;

/// Sweeps insurance policies for expiry threshold crossings.
#[derive(Debug)]
pub struct InsuranceExpiryJob {
    pool: PgPool,
    policies: InsurancePolicyRepository,
    organizations: OrganizationRepository,
    dispatcher: Arc<Dispatcher>,
    portal_base_url: String,
}

impl InsuranceExpiryJob {
    /// Create a new insurance expiry sweep.
    pub fn new(pool: PgPool, dispatcher: Arc<Dispatcher>, portal_base_url: String) -> Self {
        Self {
            policies: InsurancePolicyRepository::new(pool.clone()),
            organizations: OrganizationRepository::new(pool.clone()),
            pool,
            dispatcher,
            portal_base_url,
        }
    }

    /// Process one (policy, threshold) alert. Returns the id of the
    /// committed notification row to send, or `None` on a preference
    /// veto. The caller sends after commit.
    async fn alert(
        &self,
        policy: &InsurancePolicy,
        organization: &Organization,
        threshold: i64,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>> {
        let decision = self
            .dispatcher
            .resolver()
            .should_send(
                Some(organization.id),
                None,
                NotificationKind::InsuranceExpiring,
                NotificationChannel::Email,
                priority_for(threshold),
            )
            .await?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let notification_id = if decision.send {
            let (title, body) = expiry_message(policy, threshold);
            let params = NotificationParams {
                organization_id: Some(organization.id),
                member_id: None,
                kind: NotificationKind::InsuranceExpiring,
                channel: NotificationChannel::Email,
                priority: priority_for(threshold),
                title,
                body,
                action_url: Some(format!("{}/insurance", self.portal_base_url)),
                recipient: Some(organization.contact_email.clone()),
                scheduled_for: None,
            };
            let row = notification_from_params(&params, now);
            NotificationRepository::insert_in_tx(&mut *tx, &row).await?;
            Some(row.id)
        } else {
            tracing::info!(
                policy = %policy.id,
                threshold,
                reason = decision.reason.as_deref().unwrap_or(""),
                "Insurance alert suppressed by preferences"
            );
            None
        };

        // The flag flips even on a veto; the opt-out was honored and the
        // threshold must not fire again.
        InsurancePolicyRepository::mark_alert_sent(&mut *tx, policy.id, threshold).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit alert transaction", e)
        })?;

        Ok(notification_id)
    }
}

#[async_trait]
impl SweepJob for InsuranceExpiryJob {
    fn name(&self) -> &str {
        INSURANCE_SWEEP
    }

    async fn run(&self, now: DateTime<Utc>) -> AppResult<Value> {
        let candidates = self.policies.expiry_candidates(now).await?;
        let mut sent = 0usize;
        let mut suppressed = 0usize;
        let mut send_failures = 0usize;
        let mut errors = 0usize;

        for policy in &candidates {
            let organization = match self.organizations.find_by_id(policy.organization_id).await {
                Ok(org) => org,
                Err(e) => {
                    errors += 1;
                    tracing::error!(policy = %policy.id, error = %e, "Owner lookup failed");
                    continue;
                }
            };

            for threshold in due_expiry_thresholds(policy, now) {
                match self.alert(policy, &organization, threshold, now).await {
                    // The flag is committed at this point: a send error
                    // here is a delivery problem, not a future re-alert.
                    Ok(Some(id)) => match self.dispatcher.send(id).await {
                        Ok(result) if result.success => sent += 1,
                        Ok(_) => send_failures += 1,
                        Err(e) => {
                            send_failures += 1;
                            tracing::error!(
                                notification = %id,
                                error = %e,
                                "Insurance send errored after commit; flag remains set"
                            );
                        }
                    },
                    Ok(None) => suppressed += 1,
                    Err(e) => {
                        errors += 1;
                        tracing::error!(
                            policy = %policy.id,
                            threshold,
                            error = %e,
                            "Insurance alert failed; flag left unset"
                        );
                    }
                }
            }
        }

        Ok(serde_json::json!({
            "candidates": candidates.len(),
            "sent": sent,
            "suppressed": suppressed,
            "send_failures": send_failures,
            "errors": errors,
        }))
    }
}

/// Thresholds inside their one-day alert band with the flag still unset.
fn due_expiry_thresholds(policy: &InsurancePolicy, now: DateTime<Utc>) -> Vec<i64> {
    let days = policy.days_until_expiry(now);
    EXPIRY_THRESHOLDS
        .iter()
        .copied()
        .filter(|t| (t - 1..=*t).contains(&days) && !policy.alert_sent(*t))
        .collect()
}

fn priority_for(threshold: i64) -> NotificationPriority {
    if threshold <= 30 {
        NotificationPriority::High
    } else {
        NotificationPriority::Normal
    }
}

/// Title names the policy type; body names the day count.
fn expiry_message(policy: &InsurancePolicy, threshold: i64) -> (String, String) {
    let title = format!("{} insurance expiring soon", policy.policy_type.label());
    let body = format!(
        "Your {} policy {} with {} expires in {} days, on {}.\n\n\
         Upload your renewed certificate of currency to stay compliant.",
        policy.policy_type.label(),
        policy.policy_number,
        policy.insurer,
        threshold,
        policy.expiry_date.format("%-d %B %Y"),
    );
    (title, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use certhub_entity::compliance::PolicyType;
    use chrono::Duration;
    use uuid::Uuid;

    fn policy(expiry_in_days: i64) -> InsurancePolicy {
        let now = Utc::now();
        InsurancePolicy {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            policy_type: PolicyType::PublicLiability,
            insurer: "Vero".to_string(),
            policy_number: "PL-40221".to_string(),
            expiry_date: now + Duration::days(expiry_in_days),
            alert90_sent: false,
            alert60_sent: false,
            alert30_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_threshold_band_is_one_day() {
        let now = Utc::now();
        // days_until_expiry truncates, so "+30 days" reads as 29 or 30.
        assert_eq!(due_expiry_thresholds(&policy(30), now), vec![30]);
        assert_eq!(due_expiry_thresholds(&policy(60), now), vec![60]);
        assert!(due_expiry_thresholds(&policy(45), now).is_empty());
        assert!(due_expiry_thresholds(&policy(120), now).is_empty());
    }

    #[test]
    fn test_sent_flag_excludes_threshold() {
        let now = Utc::now();
        let mut p = policy(30);
        p.alert30_sent = true;
        assert!(due_expiry_thresholds(&p, now).is_empty());
    }

    #[test]
    fn test_message_names_policy_type_and_days() {
        let (title, body) = expiry_message(&policy(30), 30);
        assert!(title.contains("Public Liability"));
        assert!(body.contains("30 days"));
        assert!(body.contains("PL-40221"));
    }

    #[test]
    fn test_priority_escalates_at_final_threshold() {
        assert_eq!(priority_for(90), NotificationPriority::Normal);
        assert_eq!(priority_for(30), NotificationPriority::High);
    }
}
