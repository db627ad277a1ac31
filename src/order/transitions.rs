use super::Actor;
use super::ActorRole;
use super::Order;
use super::OrderStatus;
use crate::OrderError;

/// What a validated transition means for the write that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Edge {
    /// Plain forward step along the chain
    Advance,
    /// `pickup_pending -> pickup_accepted`; binds the driver
    Claim,
    /// Any non-terminal status to `cancelled`; clears the driver
    Cancel,
    /// `cancelled -> cancelled`; succeeds without writing
    AlreadyCancelled,
}

/// Checks that `to` is directly reachable from `from`.
pub(crate) fn classify_edge(
    from: OrderStatus,
    to: OrderStatus,
) -> Result<Edge, OrderError> {
    match (from, to) {
        (OrderStatus::Cancelled, OrderStatus::Cancelled) => Ok(Edge::AlreadyCancelled),
        (from, OrderStatus::Cancelled) if !from.is_terminal() => Ok(Edge::Cancel),
        (OrderStatus::PickupPending, OrderStatus::PickupAccepted) => Ok(Edge::Claim),
        (from, to) if from.successor() == Some(to) => Ok(Edge::Advance),
        (from, to) => Err(OrderError::InvalidTransition { from, to }),
    }
}

/// Checks that `actor` may move `order` to `to`.
///
/// Restaurant steps belong to the owner of the order's restaurant, delivery
/// steps to the assigned driver, the claim to any driver, and cancellation to
/// an admin or the ordering customer.
pub(crate) fn authorize(
    order: &Order,
    to: OrderStatus,
    actor: &Actor,
) -> Result<(), OrderError> {
    let allowed = match to {
        OrderStatus::Accepted | OrderStatus::Preparing | OrderStatus::PickupPending => {
            actor.owns_restaurant(&order.restaurant_id)
        }
        OrderStatus::PickupAccepted => actor.role == ActorRole::DeliveryDriver,
        OrderStatus::PickedUp | OrderStatus::Delivering | OrderStatus::Delivered => {
            actor.role == ActorRole::DeliveryDriver
                && order.driver_id.as_deref() == Some(actor.id.as_str())
        }
        OrderStatus::Cancelled => match actor.role {
            ActorRole::Admin => true,
            ActorRole::Customer => order.customer_id == actor.id,
            _ => false,
        },
        OrderStatus::Pending => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(OrderError::Forbidden {
            role: actor.role.as_str(),
            from: order.status,
            to,
        })
    }
}
