use courier_engine::Actor;
use courier_engine::AlertKind;
use courier_engine::OrderStatus;
use courier_engine::RecipientProfile;

use crate::common::wait_until;
use crate::common::TestContext;

#[tokio::test]
async fn test_session_keeps_alerting_after_feed_drop() {
    let ctx = TestContext::new(0);
    let (owner, alerts) = ctx
        .start_session(Actor::restaurant_owner("owner-1", "rest-1"), RecipientProfile::default())
        .await;
    let connects = ctx.feed.connect_count();

    ctx.feed.disconnect_all();
    wait_until(|| ctx.feed.connect_count() == connects * 2).await;

    ctx.place("o1").await;
    wait_until(|| alerts.modals().len() == 1).await;
    assert_eq!(alerts.modals()[0].kind, AlertKind::NewOrder);
    assert_eq!(owner.subscription_count(), 2);
}

#[tokio::test]
async fn test_outage_surfaces_one_connectivity_toast() {
    let ctx = TestContext::new(0);
    let (_customer, alerts) = ctx
        .start_session(Actor::customer("cust-1"), RecipientProfile::default())
        .await;
    let connects = ctx.feed.connect_count();

    // two topics, each burning more than one full backoff round
    ctx.feed.refuse_next_connects(10);
    ctx.feed.disconnect_all();

    wait_until(|| ctx.feed.connect_count() == connects * 2).await;
    let lost: Vec<_> = alerts
        .toasts()
        .into_iter()
        .filter(|t| t.kind == AlertKind::Error)
        .collect();
    assert!(!lost.is_empty() && lost.len() <= 2);
    assert_eq!(lost[0].title, "Connection lost");

    ctx.place("o1").await;
    let owner = Actor::restaurant_owner("owner-1", "rest-1");
    ctx.machine.transition("o1", OrderStatus::Accepted, &owner).await.unwrap();
    wait_until(|| alerts.toasts().iter().any(|t| t.kind == AlertKind::StatusChanged)).await;
}
