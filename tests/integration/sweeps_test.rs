//! Domain sweep tests: threshold detection, idempotence, and the
//! flag-plus-notification transaction.

use chrono::Utc;
use uuid::Uuid;

use certhub_entity::compliance::EnrolmentStatus;
use certhub_entity::notification::preference::OrganizationNotificationPreference;
use certhub_entity::notification::{
    NotificationChannel, NotificationKind, NotificationPriority,
};
use certhub_notify::dispatcher::notification_from_params;
use certhub_notify::NotificationParams;
use certhub_worker::jobs::{InsuranceExpiryJob, ProgrammeRenewalJob};
use certhub_worker::SweepJob;
use certhub_database::repositories::{
    InsurancePolicyRepository, NotificationRepository, PreferenceRepository,
};

use crate::helpers;

fn portal() -> String {
    "https://portal.certhub.test".to_string()
}

#[tokio::test]
async fn insurance_sweep_alerts_once_per_threshold() {
    let _guard = helpers::sweep_lock().await;
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let org = helpers::create_organization(&pool).await;
    let policy = helpers::create_policy(&pool, org, 30).await;
    let (dispatcher, _email, _sms) = helpers::build_dispatcher(&pool);
    let job = InsuranceExpiryJob::new(pool.clone(), dispatcher, portal());

    job.run(Utc::now()).await.unwrap();

    assert_eq!(helpers::notification_count(&pool, org, "insurance_expiring").await, 1);
    let (a90, a60, a30) = helpers::policy_flags(&pool, policy).await;
    assert!(!a90);
    assert!(!a60);
    assert!(a30);

    // Message content is asserted on the persisted row; which dispatcher
    // instance delivered it does not matter.
    let (title, body): (String, String) = sqlx::query_as(
        "SELECT title, body FROM notifications \
         WHERE organization_id = $1 AND kind = 'insurance_expiring'",
    )
    .bind(org)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(title.contains("Public Liability"));
    assert!(body.contains("30 days"));

    // The second sweep finds the flag already set and stays quiet.
    job.run(Utc::now()).await.unwrap();
    assert_eq!(helpers::notification_count(&pool, org, "insurance_expiring").await, 1);
}

#[tokio::test]
async fn insurance_veto_still_flips_the_flag() {
    let _guard = helpers::sweep_lock().await;
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let org = helpers::create_organization(&pool).await;
    let policy = helpers::create_policy(&pool, org, 60).await;

    let mut prefs = OrganizationNotificationPreference::default_for_organization(org);
    prefs.email_insurance = false;
    PreferenceRepository::new(pool.clone())
        .upsert_organization(&prefs)
        .await
        .unwrap();

    let (dispatcher, _email, _sms) = helpers::build_dispatcher(&pool);
    let job = InsuranceExpiryJob::new(pool.clone(), dispatcher, portal());
    job.run(Utc::now()).await.unwrap();

    assert_eq!(helpers::notification_count(&pool, org, "insurance_expiring").await, 0);

    // The threshold must not fire again once the opt-out was honored.
    let (_, a60, _) = helpers::policy_flags(&pool, policy).await;
    assert!(a60);
}

#[tokio::test]
async fn provider_failure_after_commit_keeps_the_flag() {
    let _guard = helpers::sweep_lock().await;
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let org = helpers::create_organization(&pool).await;
    let policy = helpers::create_policy(&pool, org, 30).await;

    let dispatcher = helpers::build_rejecting_dispatcher(&pool);
    let job = InsuranceExpiryJob::new(pool.clone(), dispatcher, portal());
    job.run(Utc::now()).await.unwrap();

    // The flag and the row committed before the delivery attempt, so a
    // provider failure leaves both in place and the row marked failed.
    let (_, _, a30) = helpers::policy_flags(&pool, policy).await;
    assert!(a30);
    assert_eq!(helpers::notification_count(&pool, org, "insurance_expiring").await, 1);

    let (status, retry_count): (String, i32) = sqlx::query_as(
        "SELECT status::text, retry_count FROM notifications \
         WHERE organization_id = $1 AND kind = 'insurance_expiring'",
    )
    .bind(org)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status, "failed");
    assert_eq!(retry_count, 1);

    // The next sweep does not re-alert; the retry sweep owns delivery now.
    job.run(Utc::now()).await.unwrap();
    assert_eq!(helpers::notification_count(&pool, org, "insurance_expiring").await, 1);
}

#[tokio::test]
async fn renewal_sweep_catches_up_missed_thresholds() {
    let _guard = helpers::sweep_lock().await;
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let org = helpers::create_organization(&pool).await;
    // 25 days out: the 90, 60, and 30 day thresholds have all passed
    // unalerted, so one sweep settles all three.
    let enrolment = helpers::create_enrolment(&pool, org, 25).await;
    let (dispatcher, _email, _sms) = helpers::build_dispatcher(&pool);
    let job = ProgrammeRenewalJob::new(pool.clone(), dispatcher, portal());

    job.run(Utc::now()).await.unwrap();

    assert_eq!(
        helpers::notification_count(&pool, org, "programme_renewal_due").await,
        3
    );
    let (status, a90, a60, a30) = helpers::enrolment_state(&pool, enrolment).await;
    assert_eq!(status, EnrolmentStatus::RenewalDue);
    assert!(a90 && a60 && a30);

    // Nothing left to do on a rerun.
    job.run(Utc::now()).await.unwrap();
    assert_eq!(
        helpers::notification_count(&pool, org, "programme_renewal_due").await,
        3
    );
}

#[tokio::test]
async fn failed_insert_rolls_back_the_flag_flip() {
    let _guard = helpers::sweep_lock().await;
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let org = helpers::create_organization(&pool).await;
    let policy = helpers::create_policy(&pool, org, 90).await;

    let mut tx = pool.begin().await.unwrap();
    InsurancePolicyRepository::mark_alert_sent(&mut *tx, policy, 90)
        .await
        .unwrap();

    // A row pointing at a nonexistent organization trips the foreign key,
    // the way any insert failure would inside the sweep transaction.
    let params = NotificationParams {
        organization_id: Some(Uuid::new_v4()),
        member_id: None,
        kind: NotificationKind::InsuranceExpiring,
        channel: NotificationChannel::Email,
        priority: NotificationPriority::Normal,
        title: "Public Liability insurance expiring soon".to_string(),
        body: "Policy PL-1 expires in 90 days.".to_string(),
        action_url: None,
        recipient: Some("owner@example.org".to_string()),
        scheduled_for: None,
    };
    let row = notification_from_params(&params, Utc::now());
    let inserted = NotificationRepository::insert_in_tx(&mut *tx, &row).await;
    assert!(inserted.is_err());
    tx.rollback().await.unwrap();

    // Neither half of the transaction stuck.
    let (a90, _, _) = helpers::policy_flags(&pool, policy).await;
    assert!(!a90);
    assert_eq!(helpers::notification_count(&pool, org, "insurance_expiring").await, 0);
}

#[tokio::test]
async fn renewal_sweep_ignores_far_anniversaries() {
    let _guard = helpers::sweep_lock().await;
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let org = helpers::create_organization(&pool).await;
    let enrolment = helpers::create_enrolment(&pool, org, 120).await;
    let (dispatcher, _email, _sms) = helpers::build_dispatcher(&pool);
    let job = ProgrammeRenewalJob::new(pool.clone(), dispatcher, portal());

    job.run(Utc::now()).await.unwrap();

    assert_eq!(
        helpers::notification_count(&pool, org, "programme_renewal_due").await,
        0
    );
    let (status, a90, _, _) = helpers::enrolment_state(&pool, enrolment).await;
    assert_eq!(status, EnrolmentStatus::Active);
    assert!(!a90);
}
