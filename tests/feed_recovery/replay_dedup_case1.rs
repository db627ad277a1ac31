//! A backend that replays recent rows on reconnect must not double-alert.

use std::time::Duration;

use courier_engine::Actor;
use courier_engine::AlertKind;
use courier_engine::ChangeEvent;
use courier_engine::RecipientProfile;
use courier_engine::RestaurantRow;
use courier_engine::Row;
use tokio::time::sleep;

use crate::common::wait_until;
use crate::common::TestContext;

fn restaurant(id: &str) -> ChangeEvent {
    ChangeEvent::insert(Row::Restaurant(RestaurantRow {
        id: id.to_string(),
        owner_id: "owner-9".to_string(),
        name: format!("Kitchen {id}"),
        created_at: 0,
    }))
}

#[tokio::test]
async fn test_replayed_change_dispatches_once() {
    let ctx = TestContext::new(16);
    let (_admin, alerts) = ctx
        .start_session(Actor::admin("admin-1"), RecipientProfile::default())
        .await;
    let connects = ctx.feed.connect_count();

    ctx.feed.publish(restaurant("r1"));
    wait_until(|| alerts.modals().len() == 1).await;

    ctx.feed.disconnect_all();
    wait_until(|| ctx.feed.connect_count() == connects * 2).await;

    // replay precedes live events on a stream, so r2 arriving means r1 was
    // seen again and suppressed
    ctx.feed.publish(restaurant("r2"));
    wait_until(|| alerts.modals().len() == 2).await;
    sleep(Duration::from_millis(50)).await;

    let modals: Vec<String> = alerts.modals().into_iter().map(|m| m.message).collect();
    assert_eq!(modals.len(), 2);
    assert!(modals[0].starts_with("Kitchen r1"));
    assert!(modals[1].starts_with("Kitchen r2"));
}

#[tokio::test]
async fn test_replayed_status_changes_dispatch_once() {
    let ctx = TestContext::new(16);
    let (_customer, alerts) = ctx
        .start_session(Actor::customer("cust-1"), RecipientProfile::muted())
        .await;
    let connects = ctx.feed.connect_count();

    ctx.ready_for_pickup("o1").await;
    wait_until(|| alerts.toasts().len() == 3).await;

    ctx.feed.disconnect_all();
    wait_until(|| ctx.feed.connect_count() == connects * 2).await;
    ctx.machine.cancel("o1", &Actor::customer("cust-1")).await.unwrap();

    wait_until(|| alerts.toasts().len() == 4).await;
    sleep(Duration::from_millis(50)).await;
    let kinds: Vec<AlertKind> = alerts.toasts().into_iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![AlertKind::StatusChanged; 4]);
}
