use super::AlertEvent;
use super::AlertKind;
use super::AlertPayload;
use crate::feed::EventKind;
use crate::feed::MessageRow;
use crate::feed::RestaurantRow;
use crate::Actor;
use crate::ActorRole;
use crate::ChangeEvent;
use crate::Order;
use crate::OrderStatus;
use crate::Row;

/// Maps a change event to the alert `viewer` should get, if any.
///
/// Pure: no I/O, no clock, no dedup. Anything the table below does not name
/// yields `None`.
///
/// | event                                   | viewer                      | kind               |
/// |-----------------------------------------|-----------------------------|--------------------|
/// | orders INSERT                           | owner of the restaurant     | new order          |
/// | orders UPDATE, status moved             | customer owning the order   | status changed     |
/// | orders UPDATE to unclaimed pickup       | any delivery driver         | delivery available |
/// | orders UPDATE to cancelled              | admin                       | admin urgent       |
/// | restaurants INSERT                      | admin                       | admin urgent       |
/// | messages INSERT addressed to the viewer | anyone                      | new message        |
pub fn classify(
    event: &ChangeEvent,
    viewer: &Actor,
) -> Option<AlertEvent> {
    match (&event.new, event.kind) {
        (Row::Order(order), EventKind::Insert) => classify_order_insert(order, viewer),
        (Row::Order(order), EventKind::Update) => {
            if !event.status_changed() {
                return None;
            }
            classify_order_update(order, viewer)
        }
        (Row::Restaurant(restaurant), EventKind::Insert) => {
            classify_restaurant_insert(restaurant, viewer)
        }
        (Row::Message(message), EventKind::Insert) => classify_message_insert(message, viewer),
        _ => None,
    }
}

fn classify_order_insert(
    order: &Order,
    viewer: &Actor,
) -> Option<AlertEvent> {
    if !viewer.owns_restaurant(&order.restaurant_id) {
        return None;
    }
    Some(AlertEvent::new(
        AlertKind::NewOrder,
        Some(viewer.role),
        "New order",
        format!(
            "Order #{} for {} is waiting for you",
            order.short_id(),
            format_cents(order.total_cents)
        ),
        order_payload(order),
    ))
}

fn classify_order_update(
    order: &Order,
    viewer: &Actor,
) -> Option<AlertEvent> {
    match viewer.role {
        ActorRole::Customer if order.customer_id == viewer.id => Some(AlertEvent::new(
            AlertKind::StatusChanged,
            Some(viewer.role),
            "Order update",
            format!("Your order #{} is {}", order.short_id(), order.status.label()),
            order_payload(order),
        )),
        ActorRole::DeliveryDriver if order.is_available_for_pickup() => Some(AlertEvent::new(
            AlertKind::DeliveryAvailable,
            Some(viewer.role),
            "Delivery available",
            format!("Order #{} is ready for pickup", order.short_id()),
            order_payload(order),
        )),
        ActorRole::Admin if order.status == OrderStatus::Cancelled => Some(AlertEvent::new(
            AlertKind::AdminUrgent,
            Some(viewer.role),
            "Order cancelled",
            format!("Order #{} was cancelled", order.short_id()),
            order_payload(order),
        )),
        _ => None,
    }
}

fn classify_restaurant_insert(
    restaurant: &RestaurantRow,
    viewer: &Actor,
) -> Option<AlertEvent> {
    if viewer.role != ActorRole::Admin {
        return None;
    }
    Some(AlertEvent::new(
        AlertKind::AdminUrgent,
        Some(viewer.role),
        "New restaurant",
        format!("{} registered and awaits review", restaurant.name),
        AlertPayload::Restaurant {
            restaurant_id: restaurant.id.clone(),
        },
    ))
}

fn classify_message_insert(
    message: &MessageRow,
    viewer: &Actor,
) -> Option<AlertEvent> {
    if message.receiver_id != viewer.id || message.sender_id == viewer.id {
        return None;
    }
    Some(AlertEvent::new(
        AlertKind::NewMessage,
        Some(viewer.role),
        "New message",
        preview(&message.content),
        AlertPayload::Message {
            message_id: message.id.clone(),
            sender_id: message.sender_id.clone(),
        },
    ))
}

fn order_payload(order: &Order) -> AlertPayload {
    AlertPayload::Order {
        order_id: order.id.clone(),
        status: order.status,
    }
}

fn format_cents(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

const PREVIEW_CHARS: usize = 80;

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let mut cut: String = content.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}
