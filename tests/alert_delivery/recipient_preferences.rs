use courier_engine::Actor;
use courier_engine::AlertKind;
use courier_engine::ChangeEvent;
use courier_engine::MessageRow;
use courier_engine::OrderStatus;
use courier_engine::PushPermission;
use courier_engine::RecipientProfile;
use courier_engine::Row;

use crate::common::wait_until;
use crate::common::TestContext;

fn owner() -> Actor {
    Actor::restaurant_owner("owner-1", "rest-1")
}

#[tokio::test]
async fn test_customer_with_push_disabled_gets_toast_only() {
    let ctx = TestContext::new(0);
    let profile = RecipientProfile {
        push_enabled: false,
        ..RecipientProfile::default().with_push_permission(PushPermission::Granted)
    };
    let (_customer, alerts) = ctx.start_session(Actor::customer("cust-1"), profile).await;

    ctx.place("o1").await;
    ctx.machine.transition("o1", OrderStatus::Accepted, &owner()).await.unwrap();

    wait_until(|| alerts.toasts().len() == 1).await;
    assert_eq!(alerts.toasts()[0].kind, AlertKind::StatusChanged);
    assert!(alerts.pushes().is_empty());
    assert!(alerts.modals().is_empty());
}

#[tokio::test]
async fn test_push_needs_granted_permission() {
    let ctx = TestContext::new(0);
    let (_asked, undecided) = ctx
        .start_session(Actor::customer("cust-1"), RecipientProfile::default())
        .await;

    ctx.place("o1").await;
    ctx.machine.transition("o1", OrderStatus::Accepted, &owner()).await.unwrap();

    wait_until(|| undecided.toasts().len() == 1).await;
    assert!(undecided.pushes().is_empty());
    assert_eq!(undecided.sounds(), vec![(AlertKind::StatusChanged, 80)]);
}

#[tokio::test]
async fn test_new_order_sound_ignores_muted_owner() {
    let ctx = TestContext::new(0);
    let (_owner, alerts) = ctx
        .start_session(owner(), RecipientProfile::muted().with_volume(0))
        .await;

    ctx.place("o1").await;

    wait_until(|| alerts.modals().len() == 1).await;
    assert_eq!(alerts.modals()[0].kind, AlertKind::NewOrder);
    assert_eq!(alerts.sounds(), vec![(AlertKind::NewOrder, 100)]);
    assert_eq!(alerts.vibrations().len(), 1);
}

#[tokio::test]
async fn test_message_alerts_reach_receiver_only() {
    let ctx = TestContext::new(0);
    let (_sender, sender_alerts) = ctx
        .start_session(Actor::customer("cust-1"), RecipientProfile::default())
        .await;
    let (_receiver, receiver_alerts) = ctx
        .start_session(Actor::driver("d1"), RecipientProfile::default())
        .await;

    ctx.feed.publish(ChangeEvent::insert(Row::Message(MessageRow {
        id: "m1".to_string(),
        sender_id: "cust-1".to_string(),
        receiver_id: "d1".to_string(),
        content: "Ring twice please".to_string(),
        created_at: 0,
    })));

    wait_until(|| receiver_alerts.toasts().len() == 1).await;
    assert_eq!(receiver_alerts.toasts()[0].kind, AlertKind::NewMessage);
    assert!(receiver_alerts.toasts()[0].message.contains("Ring twice please"));
    assert!(sender_alerts.calls().is_empty());
}
