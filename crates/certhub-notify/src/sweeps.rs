//! Delivery sweeps: scheduled sends and bounded retries.
//!
//! Both sweeps are driven by the worker on a cron cadence and process a
//! bounded batch per run. A failure on one notification never aborts the
//! rest of the batch.

use chrono::{DateTime, Utc};
use serde::Serialize;

use certhub_core::AppResult;

use crate::dispatcher::Dispatcher;

/// Counts reported by a delivery sweep run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepSummary {
    /// Rows picked up by the sweep.
    pub examined: usize,
    /// Rows delivered.
    pub sent: usize,
    /// Rows that failed their attempt.
    pub failed: usize,
}

impl Dispatcher {
    /// Send pending notifications whose scheduled time has elapsed.
    pub async fn process_scheduled(&self, now: DateTime<Utc>) -> AppResult<SweepSummary> {
        let due = self
            .store
            .due_scheduled(now, self.config.scheduled_batch_size)
            .await?;
        let mut summary = SweepSummary {
            examined: due.len(),
            ..Default::default()
        };

        for notification in due {
            match self.send(notification.id).await {
                Ok(result) if result.success => summary.sent += 1,
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(id = %notification.id, error = %e, "Scheduled send errored");
                }
            }
        }

        Ok(summary)
    }

    /// Re-attempt failed notifications with retry budget remaining.
    ///
    /// Each pickup stamps `last_retry_at` before the attempt so a crashed
    /// run leaves a trace.
    pub async fn retry_failed(&self, now: DateTime<Utc>) -> AppResult<SweepSummary> {
        let due = self
            .store
            .due_retries(now, self.config.max_retries, self.config.retry_batch_size)
            .await?;
        let mut summary = SweepSummary {
            examined: due.len(),
            ..Default::default()
        };

        for notification in due {
            if let Err(e) = self.store.mark_retrying(notification.id, now).await {
                summary.failed += 1;
                tracing::error!(id = %notification.id, error = %e, "Retry stamp failed");
                continue;
            }
            match self.send(notification.id).await {
                Ok(result) if result.success => summary.sent += 1,
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(id = %notification.id, error = %e, "Retry send errored");
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::notification_from_params;
    use crate::testing::{test_dispatcher, test_params, MemoryNotificationStore};
    use certhub_entity::notification::{NotificationChannel, NotificationStatus};
    use chrono::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_scheduled_sweep_sends_only_elapsed_rows() {
        let store = Arc::new(MemoryNotificationStore::default());
        let (dispatcher, email, _sms) = test_dispatcher(store.clone(), None, None, false, false);
        let now = Utc::now();

        let mut due = test_params(NotificationChannel::Email);
        due.scheduled_for = Some(now - Duration::minutes(5));
        let due_row = notification_from_params(&due, now - Duration::hours(1));
        store.put(due_row.clone());

        let mut future = test_params(NotificationChannel::Email);
        future.scheduled_for = Some(now + Duration::hours(5));
        let future_row = notification_from_params(&future, now);
        store.put(future_row.clone());

        let summary = dispatcher.process_scheduled(now).await.unwrap();
        assert_eq!(summary.examined, 1);
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 0);

        assert_eq!(store.get(due_row.id).status, NotificationStatus::Sent);
        assert_eq!(store.get(future_row.id).status, NotificationStatus::Pending);
        assert_eq!(email.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_scheduled_sweep_counts_failures() {
        let store = Arc::new(MemoryNotificationStore::default());
        let (dispatcher, _email, _sms) = test_dispatcher(store.clone(), None, None, true, false);
        let now = Utc::now();

        let mut due = test_params(NotificationChannel::Email);
        due.scheduled_for = Some(now - Duration::minutes(5));
        let row = notification_from_params(&due, now - Duration::hours(1));
        store.put(row.clone());

        let summary = dispatcher.process_scheduled(now).await.unwrap();
        assert_eq!(summary.failed, 1);

        let stored = store.get(row.id);
        assert_eq!(stored.status, NotificationStatus::Failed);
        assert_eq!(stored.retry_count, 1);
    }

    #[tokio::test]
    async fn test_retry_sweep_recovers_failed_row() {
        let store = Arc::new(MemoryNotificationStore::default());
        let now = Utc::now();

        // First attempt fails.
        {
            let (dispatcher, _email, _sms) =
                test_dispatcher(store.clone(), None, None, true, false);
            let result = dispatcher
                .create(test_params(NotificationChannel::Email))
                .await
                .unwrap();
            assert!(!result.success);
        }

        // The provider comes back; retry succeeds.
        let (dispatcher, email, _sms) = test_dispatcher(store.clone(), None, None, false, false);
        let later = now + Duration::minutes(10);
        let summary = dispatcher.retry_failed(later).await.unwrap();
        assert_eq!(summary.examined, 1);
        assert_eq!(summary.sent, 1);
        assert_eq!(email.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_retries_stop_after_budget_exhausted() {
        let store = Arc::new(MemoryNotificationStore::default());
        let (dispatcher, _email, _sms) = test_dispatcher(store.clone(), None, None, true, false);

        let result = dispatcher
            .create(test_params(NotificationChannel::Email))
            .await
            .unwrap();
        let id = result.notification_id.unwrap();
        assert_eq!(store.get(id).retry_count, 1);

        // Two more sweeps, each far enough ahead to be due.
        let mut now = Utc::now();
        for expected_count in [2, 3] {
            now = now + Duration::hours(3);
            let summary = dispatcher.retry_failed(now).await.unwrap();
            assert_eq!(summary.examined, 1);
            assert_eq!(store.get(id).retry_count, expected_count);
        }

        // Budget exhausted: terminal, no next retry, never picked up again.
        let row = store.get(id);
        assert_eq!(row.status, NotificationStatus::Failed);
        assert!(row.next_retry_at.is_none());

        let summary = dispatcher
            .retry_failed(now + Duration::days(30))
            .await
            .unwrap();
        assert_eq!(summary.examined, 0);
    }

    #[tokio::test]
    async fn test_retry_sweep_stamps_last_retry_at() {
        let store = Arc::new(MemoryNotificationStore::default());
        let (dispatcher, _email, _sms) = test_dispatcher(store.clone(), None, None, true, false);

        let result = dispatcher
            .create(test_params(NotificationChannel::Email))
            .await
            .unwrap();
        let id = result.notification_id.unwrap();

        let sweep_at = Utc::now() + Duration::hours(1);
        dispatcher.retry_failed(sweep_at).await.unwrap();
        assert_eq!(store.get(id).last_retry_at, Some(sweep_at));
    }
}
