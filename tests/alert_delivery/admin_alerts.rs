use courier_engine::Actor;
use courier_engine::AlertKind;
use courier_engine::AlertPayload;
use courier_engine::ChangeEvent;
use courier_engine::OrderStatus;
use courier_engine::RecipientProfile;
use courier_engine::RestaurantRow;
use courier_engine::Row;
use courier_engine::Tier;

use crate::common::wait_until;
use crate::common::TestContext;

fn restaurant_registered(id: &str) -> ChangeEvent {
    ChangeEvent::insert(Row::Restaurant(RestaurantRow {
        id: id.to_string(),
        owner_id: "owner-9".to_string(),
        name: "Noodle Bar".to_string(),
        created_at: 1_700_000_000_000,
    }))
}

#[tokio::test]
async fn test_admin_gets_single_modal_for_new_restaurant() {
    let ctx = TestContext::new(0);
    let (admin, alerts) = ctx
        .start_session(Actor::admin("admin-1"), RecipientProfile::default())
        .await;

    ctx.feed.publish(restaurant_registered("r-77"));

    wait_until(|| alerts.modals().len() == 1).await;
    let modal = &alerts.modals()[0];
    assert_eq!(modal.kind, AlertKind::AdminUrgent);
    assert_eq!(modal.tier, Tier::Urgent);
    assert_eq!(
        modal.payload,
        AlertPayload::Restaurant {
            restaurant_id: "r-77".to_string()
        }
    );
    assert!(alerts.toasts().is_empty());
    // push is forced for admin alerts
    assert_eq!(alerts.pushes().len(), 1);
    assert_eq!(alerts.pushes()[0].tag, "courier-restaurant-r-77");
    assert_eq!(admin.dispatcher().active_modal().map(|m| m.id), Some(modal.id.clone()));

    admin.end();
    ctx.shutdown().await;
}

#[tokio::test]
async fn test_admin_is_alerted_to_cancellations_only() {
    let ctx = TestContext::new(0);
    let (_admin, alerts) = ctx
        .start_session(Actor::admin("admin-1"), RecipientProfile::muted())
        .await;

    ctx.place("o1").await;
    let owner = Actor::restaurant_owner("owner-1", "rest-1");
    ctx.machine.transition("o1", OrderStatus::Accepted, &owner).await.unwrap();
    ctx.machine.cancel("o1", &Actor::customer("cust-1")).await.unwrap();

    wait_until(|| alerts.modals().len() == 1).await;
    assert_eq!(alerts.modals()[0].title, "Order cancelled");
    // muted profile: only the forced push remains
    assert!(alerts.sounds().is_empty());
    assert!(alerts.vibrations().is_empty());
    assert_eq!(alerts.pushes().len(), 1);
}

#[tokio::test]
async fn test_dismissing_modal_clears_slot() {
    let ctx = TestContext::new(0);
    let (admin, alerts) = ctx
        .start_session(Actor::admin("admin-1"), RecipientProfile::default())
        .await;

    ctx.feed.publish(restaurant_registered("r-1"));
    ctx.feed.publish(restaurant_registered("r-2"));
    wait_until(|| alerts.modals().len() == 2).await;

    let first = alerts.modals()[0].id.clone();
    let second = alerts.modals()[1].id.clone();
    assert!(!admin.dispatcher().dismiss_modal(&first));
    assert!(admin.dispatcher().dismiss_modal(&second));
    assert!(admin.dispatcher().active_modal().is_none());
}
