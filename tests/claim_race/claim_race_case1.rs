//! Two drivers race for the same pickup through their own sessions.

use courier_engine::Actor;
use courier_engine::AlertKind;
use courier_engine::OrderStatus;
use courier_engine::PushPermission;
use courier_engine::RecipientProfile;

use crate::common::wait_until;
use crate::common::TestContext;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_have_exactly_one_winner() {
    let ctx = TestContext::new(0);
    let (d1, d1_alerts) = ctx.start_session(Actor::driver("D1"), RecipientProfile::default()).await;
    let (d2, d2_alerts) = ctx.start_session(Actor::driver("D2"), RecipientProfile::default()).await;

    ctx.ready_for_pickup("O1").await;
    wait_until(|| d1.available_orders().len() == 1 && d2.available_orders().len() == 1).await;

    let (r1, r2) = tokio::join!(d1.claim("O1"), d2.claim("O1"));

    let (winner, loser, loser_alerts) = match (&r1, &r2) {
        (Ok(_), Err(e)) if e.is_claim_conflict() => ("D1", &d2, &d2_alerts),
        (Err(e), Ok(_)) if e.is_claim_conflict() => ("D2", &d1, &d1_alerts),
        other => panic!("expected one winner and one conflict, got {other:?}"),
    };

    let order = ctx.machine.fetch("O1").await.unwrap();
    assert_eq!(order.status, OrderStatus::PickupAccepted);
    assert_eq!(order.driver_id.as_deref(), Some(winner));
    assert!(loser.available_orders().is_empty());
    assert!(loser_alerts.toasts().iter().all(|t| t.kind != AlertKind::Error));

    d1.end();
    d2.end();
    ctx.shutdown().await;
}

#[tokio::test]
async fn test_winner_drives_order_to_delivered() {
    let ctx = TestContext::new(0);
    let (driver, _) = ctx.start_session(Actor::driver("D1"), RecipientProfile::default()).await;
    let profile = RecipientProfile::default().with_push_permission(PushPermission::Granted);
    let (_customer, customer_alerts) = ctx.start_session(Actor::customer("cust-1"), profile).await;
    ctx.ready_for_pickup("O1").await;

    driver.claim("O1").await.unwrap();
    for status in [OrderStatus::PickedUp, OrderStatus::Delivering, OrderStatus::Delivered] {
        driver.transition("O1", status).await.unwrap();
    }

    // accepted, preparing, pickup_pending, pickup_accepted, picked_up, delivering, delivered
    wait_until(|| customer_alerts.toasts().len() == 7).await;
    let last = customer_alerts.toasts().pop().unwrap();
    assert_eq!(last.kind, AlertKind::StatusChanged);
    assert!(last.message.contains(OrderStatus::Delivered.label()));
    assert_eq!(customer_alerts.pushes().len(), 7);
}
