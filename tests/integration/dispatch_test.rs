//! Dispatch engine tests against the Postgres repositories.

use chrono::Utc;

use certhub_entity::notification::preference::UserNotificationPreference;
use certhub_entity::notification::{
    NotificationChannel, NotificationKind, NotificationPriority, NotificationStatus,
};
use certhub_notify::NotificationParams;
use certhub_database::repositories::PreferenceRepository;

use crate::helpers;

fn email_params(
    organization_id: uuid::Uuid,
    member_id: uuid::Uuid,
    recipient: &str,
) -> NotificationParams {
    NotificationParams {
        organization_id: Some(organization_id),
        member_id: Some(member_id),
        kind: NotificationKind::DocumentReviewDue,
        channel: NotificationChannel::Email,
        priority: NotificationPriority::Normal,
        title: "Document review due: Health and Safety Plan".to_string(),
        body: "The Health and Safety Plan is due for review in 7 days.".to_string(),
        action_url: None,
        recipient: Some(recipient.to_string()),
        scheduled_for: None,
    }
}

#[tokio::test]
async fn create_persists_and_delivers_email() {
    let _guard = helpers::sweep_lock().await;
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let org = helpers::create_organization(&pool).await;
    let member = helpers::create_member(&pool, org).await;
    let (dispatcher, email, _sms) = helpers::build_dispatcher(&pool);

    let result = dispatcher
        .create(email_params(org, member, "owner@example.org"))
        .await
        .unwrap();

    assert!(result.success);
    assert!(!result.skipped);
    assert!(result.external_id.is_some());

    let id = result.notification_id.unwrap();
    let (status, retry_count): (NotificationStatus, i32) =
        sqlx::query_as("SELECT status, retry_count FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, NotificationStatus::Sent);
    assert_eq!(retry_count, 0);

    let messages = email.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].to, "owner@example.org");
    assert_eq!(
        messages[0].subject,
        "Document review due: Health and Safety Plan"
    );
}

#[tokio::test]
async fn user_channel_toggle_splits_email_and_sms() {
    let _guard = helpers::sweep_lock().await;
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let org = helpers::create_organization(&pool).await;
    let member = helpers::create_member(&pool, org).await;
    let (dispatcher, email, sms) = helpers::build_dispatcher(&pool);

    // Email off, SMS on for this member.
    let mut prefs = UserNotificationPreference::default_for_member(member);
    prefs.email_enabled = false;
    PreferenceRepository::new(pool.clone())
        .upsert_user(&prefs)
        .await
        .unwrap();

    let vetoed = dispatcher
        .create(email_params(org, member, "owner@example.org"))
        .await
        .unwrap();
    assert!(vetoed.skipped);
    assert!(vetoed.notification_id.is_none(), "veto must not persist a row");

    let mut sms_params = email_params(org, member, "+64211234567");
    sms_params.channel = NotificationChannel::Sms;
    let delivered = dispatcher.create(sms_params).await.unwrap();
    assert!(delivered.success);
    assert!(!delivered.skipped);

    assert!(email.messages.lock().unwrap().is_empty());
    assert_eq!(sms.messages.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn scheduled_notification_stays_pending_until_sweep() {
    let _guard = helpers::sweep_lock().await;
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let org = helpers::create_organization(&pool).await;
    let member = helpers::create_member(&pool, org).await;
    let (dispatcher, email, _sms) = helpers::build_dispatcher(&pool);

    let mut params = email_params(org, member, "owner@example.org");
    params.scheduled_for = Some(Utc::now() + chrono::Duration::hours(2));
    let result = dispatcher.create(params).await.unwrap();
    let id = result.notification_id.unwrap();
    assert!(email.messages.lock().unwrap().is_empty());

    // Nothing due yet; the row stays pending.
    dispatcher.process_scheduled(Utc::now()).await.unwrap();
    let (status,): (NotificationStatus,) =
        sqlx::query_as("SELECT status FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, NotificationStatus::Pending);

    // Once the scheduled time elapses the sweep delivers it.
    let summary = dispatcher
        .process_scheduled(Utc::now() + chrono::Duration::hours(3))
        .await
        .unwrap();
    assert!(summary.sent >= 1);
    assert!(email
        .messages
        .lock()
        .unwrap()
        .iter()
        .any(|m| m.to == "owner@example.org"));

    let (status,): (NotificationStatus,) =
        sqlx::query_as("SELECT status FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, NotificationStatus::Sent);
}
