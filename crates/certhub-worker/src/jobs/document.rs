//! Document review sweep.
//!
//! Alerts the organization owner when a controlled document approaches
//! its scheduled review date, at 30 and 7 days out.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use certhub_core::error::{AppError, ErrorKind};
use certhub_core::result::AppResult;
use certhub_entity::compliance::{ComplianceDocument, REVIEW_THRESHOLDS};
use certhub_entity::directory::Organization;
use certhub_entity::notification::{
    NotificationChannel, NotificationKind, NotificationPriority,
};
use certhub_notify::dispatcher::notification_from_params;
use certhub_notify::{Dispatcher, NotificationParams};

use certhub_database::repositories::{
    DocumentRepository, NotificationRepository, OrganizationRepository,
};

use crate::job::SweepJob;
use crate::jobs::DOCUMENT_SWEEP;

/// Sweeps controlled documents for review-date threshold crossings.
#[derive(Debug)]
pub struct DocumentReviewJob {
    pool: PgPool,
    documents: DocumentRepository,
    organizations: OrganizationRepository,
    dispatcher: Arc<Dispatcher>,
    portal_base_url: String,
}

impl DocumentReviewJob {
    /// Create a new document review sweep.
    pub fn new(pool: PgPool, dispatcher: Arc<Dispatcher>, portal_base_url: String) -> Self {
        Self {
            documents: DocumentRepository::new(pool.clone()),
            organizations: OrganizationRepository::new(pool.clone()),
            pool,
            dispatcher,
            portal_base_url,
        }
    }

    /// Commit the notification row and flag flip for one threshold.
    /// Returns the id of the row to send, or `None` on a preference
    /// veto. The caller sends after commit.
    async fn alert(
        &self,
        document: &ComplianceDocument,
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
                NotificationKind::DocumentReviewDue,
                NotificationChannel::Email,
                NotificationPriority::Normal,
            )
            .await?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let notification_id = if decision.send {
            let (title, body) = review_message(document, threshold);
            let params = NotificationParams {
                organization_id: Some(organization.id),
                member_id: None,
                kind: NotificationKind::DocumentReviewDue,
                channel: NotificationChannel::Email,
                priority: NotificationPriority::Normal,
                title,
                body,
                action_url: Some(format!("{}/documents", self.portal_base_url)),
                recipient: Some(organization.contact_email.clone()),
                scheduled_for: None,
            };
            let row = notification_from_params(&params, now);
            NotificationRepository::insert_in_tx(&mut *tx, &row).await?;
            Some(row.id)
        } else {
            tracing::info!(
                document = %document.id,
                threshold,
                reason = decision.reason.as_deref().unwrap_or(""),
                "Review alert suppressed by preferences"
            );
            None
        };

        DocumentRepository::mark_review_alert_sent(&mut *tx, document.id, threshold).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit alert transaction", e)
        })?;

        Ok(notification_id)
    }
}

#[async_trait]
impl SweepJob for DocumentReviewJob {
    fn name(&self) -> &str {
        DOCUMENT_SWEEP
    }

    async fn run(&self, now: DateTime<Utc>) -> AppResult<Value> {
        let candidates = self.documents.review_candidates(now).await?;
        let mut sent = 0usize;
        let mut suppressed = 0usize;
        let mut send_failures = 0usize;
        let mut errors = 0usize;

        for document in &candidates {
            let organization = match self.organizations.find_by_id(document.organization_id).await
            {
                Ok(org) => org,
                Err(e) => {
                    errors += 1;
                    tracing::error!(document = %document.id, error = %e, "Owner lookup failed");
                    continue;
                }
            };

            for threshold in due_review_thresholds(document, now) {
                match self.alert(document, &organization, threshold, now).await {
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
                                "Review send errored after commit; flag remains set"
                            );
                        }
                    },
                    Ok(None) => suppressed += 1,
                    Err(e) => {
                        errors += 1;
                        tracing::error!(
                            document = %document.id,
                            threshold,
                            error = %e,
                            "Review alert failed; flag left unset"
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
fn due_review_thresholds(document: &ComplianceDocument, now: DateTime<Utc>) -> Vec<i64> {
    let days = document.days_until_review(now);
    REVIEW_THRESHOLDS
        .iter()
        .copied()
        .filter(|t| (t - 1..=*t).contains(&days) && !document.review_alert_sent(*t))
        .collect()
}

fn review_message(document: &ComplianceDocument, threshold: i64) -> (String, String) {
    let title = format!("Document review due: {}", document.title);
    let body = format!(
        "\"{}\" is due for review in {} days, on {}.\n\n\
         Review and re-approve the document to keep it current.",
        document.title,
        threshold,
        document.review_date.format("%-d %B %Y"),
    );
    (title, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn document(review_in_days: i64) -> ComplianceDocument {
        let now = Utc::now();
        ComplianceDocument {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            title: "Site Safety Plan".to_string(),
            review_date: now + Duration::days(review_in_days),
            review_alert30_sent: false,
            review_alert7_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_review_thresholds() {
        let now = Utc::now();
        assert_eq!(due_review_thresholds(&document(30), now), vec![30]);
        assert_eq!(due_review_thresholds(&document(7), now), vec![7]);
        assert!(due_review_thresholds(&document(15), now).is_empty());
    }

    #[test]
    fn test_sent_flag_excludes_threshold() {
        let now = Utc::now();
        let mut d = document(7);
        d.review_alert7_sent = true;
        assert!(due_review_thresholds(&d, now).is_empty());
    }

    #[test]
    fn test_message_names_document_and_days() {
        let (title, body) = review_message(&document(7), 7);
        assert!(title.contains("Site Safety Plan"));
        assert!(body.contains("7 days"));
    }
}
