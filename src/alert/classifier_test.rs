use super::*;
use crate::feed::MessageRow;
use crate::feed::RestaurantRow;
use crate::Actor;
use crate::ActorRole;
use crate::ChangeEvent;
use crate::Order;
use crate::OrderStatus;
use crate::Row;

fn order(status: OrderStatus) -> Order {
    let mut order = Order::new("order-0001-abcd", "cust-1", "rest-1", 2350, "1 Main St");
    order.status = status;
    if status.requires_driver() {
        order.driver_id = Some("driver-1".to_string());
    }
    order
}

fn status_update(
    from: OrderStatus,
    to: OrderStatus,
) -> ChangeEvent {
    ChangeEvent::update(Some(Row::Order(order(from))), Row::Order(order(to)))
}

fn message(
    sender: &str,
    receiver: &str,
) -> ChangeEvent {
    ChangeEvent::insert(Row::Message(MessageRow {
        id: "msg-1".to_string(),
        sender_id: sender.to_string(),
        receiver_id: receiver.to_string(),
        content: "where is my food?".to_string(),
        created_at: 0,
    }))
}

fn restaurant_insert() -> ChangeEvent {
    ChangeEvent::insert(Row::Restaurant(RestaurantRow {
        id: "rest-9".to_string(),
        owner_id: "owner-9".to_string(),
        name: "Noodle Bar".to_string(),
        created_at: 0,
    }))
}

#[test]
fn test_order_insert_alerts_owning_restaurant() {
    let event = ChangeEvent::insert(Row::Order(order(OrderStatus::Pending)));
    let owner = Actor::restaurant_owner("owner-1", "rest-1");

    let alert = classify(&event, &owner).unwrap();
    assert_eq!(alert.kind, AlertKind::NewOrder);
    assert_eq!(alert.tier, Tier::Urgent);
    assert_eq!(alert.target_role, Some(ActorRole::RestaurantOwner));
    assert!(alert.message.contains("#order-00"));
    assert!(alert.message.contains("$23.50"));
    assert_eq!(
        alert.payload,
        AlertPayload::Order {
            order_id: "order-0001-abcd".to_string(),
            status: OrderStatus::Pending
        }
    );
}

#[test]
fn test_order_insert_ignored_by_other_restaurant_owner() {
    let event = ChangeEvent::insert(Row::Order(order(OrderStatus::Pending)));
    let stranger = Actor::restaurant_owner("owner-2", "rest-2");

    assert!(classify(&event, &stranger).is_none());
}

#[test]
fn test_order_insert_ignored_by_other_roles() {
    let event = ChangeEvent::insert(Row::Order(order(OrderStatus::Pending)));

    assert!(classify(&event, &Actor::customer("cust-1")).is_none());
    assert!(classify(&event, &Actor::driver("driver-1")).is_none());
    assert!(classify(&event, &Actor::admin("admin-1")).is_none());
}

#[test]
fn test_status_change_alerts_owning_customer() {
    let event = status_update(OrderStatus::Accepted, OrderStatus::Preparing);

    let alert = classify(&event, &Actor::customer("cust-1")).unwrap();
    assert_eq!(alert.kind, AlertKind::StatusChanged);
    assert_eq!(alert.tier, Tier::Toast);
    assert!(alert.message.contains("being prepared"));

    assert!(classify(&event, &Actor::customer("cust-2")).is_none());
}

#[test]
fn test_update_without_status_change_is_ignored() {
    let event = status_update(OrderStatus::Preparing, OrderStatus::Preparing);

    assert!(classify(&event, &Actor::customer("cust-1")).is_none());
}

#[test]
fn test_update_without_old_row_counts_as_status_change() {
    let event = ChangeEvent::update(None, Row::Order(order(OrderStatus::Delivering)));

    let alert = classify(&event, &Actor::customer("cust-1")).unwrap();
    assert_eq!(alert.kind, AlertKind::StatusChanged);
}

#[test]
fn test_pickup_pending_alerts_any_driver() {
    let event = status_update(OrderStatus::Preparing, OrderStatus::PickupPending);

    let alert = classify(&event, &Actor::driver("driver-7")).unwrap();
    assert_eq!(alert.kind, AlertKind::DeliveryAvailable);
    assert_eq!(alert.target_role, Some(ActorRole::DeliveryDriver));
}

#[test]
fn test_claimed_order_is_not_offered_to_drivers() {
    let event = status_update(OrderStatus::PickupPending, OrderStatus::PickupAccepted);

    assert!(classify(&event, &Actor::driver("driver-7")).is_none());
}

#[test]
fn test_cancellation_alerts_admin() {
    let event = status_update(OrderStatus::Preparing, OrderStatus::Cancelled);

    let alert = classify(&event, &Actor::admin("admin-1")).unwrap();
    assert_eq!(alert.kind, AlertKind::AdminUrgent);
    assert_eq!(alert.tier, Tier::Urgent);
}

#[test]
fn test_admin_ignores_ordinary_status_changes() {
    let event = status_update(OrderStatus::Pending, OrderStatus::Accepted);

    assert!(classify(&event, &Actor::admin("admin-1")).is_none());
}

#[test]
fn test_restaurant_insert_alerts_admin_only() {
    let event = restaurant_insert();

    let alert = classify(&event, &Actor::admin("admin-1")).unwrap();
    assert_eq!(alert.kind, AlertKind::AdminUrgent);
    assert!(alert.message.contains("Noodle Bar"));

    assert!(classify(&event, &Actor::restaurant_owner("owner-9", "rest-9")).is_none());
    assert!(classify(&event, &Actor::customer("cust-1")).is_none());
}

#[test]
fn test_message_alerts_receiver_of_any_role() {
    let event = message("cust-1", "driver-1");

    let alert = classify(&event, &Actor::driver("driver-1")).unwrap();
    assert_eq!(alert.kind, AlertKind::NewMessage);
    assert_eq!(alert.message, "where is my food?");

    assert!(classify(&event, &Actor::customer("cust-1")).is_none());
    assert!(classify(&event, &Actor::driver("driver-2")).is_none());
}

#[test]
fn test_message_to_self_is_ignored() {
    let event = message("admin-1", "admin-1");

    assert!(classify(&event, &Actor::admin("admin-1")).is_none());
}

#[test]
fn test_long_message_is_truncated() {
    let mut event = message("cust-1", "owner-1");
    if let Row::Message(m) = &mut event.new {
        m.content = "x".repeat(200);
    }

    let alert = classify(&event, &Actor::restaurant_owner("owner-1", "rest-1")).unwrap();
    assert_eq!(alert.message.chars().count(), 81);
    assert!(alert.message.ends_with('…'));
}

#[test]
fn test_alert_ids_are_unique() {
    let event = ChangeEvent::insert(Row::Order(order(OrderStatus::Pending)));
    let owner = Actor::restaurant_owner("owner-1", "rest-1");

    let a = classify(&event, &owner).unwrap();
    let b = classify(&event, &owner).unwrap();
    assert_ne!(a.id, b.id);
}
