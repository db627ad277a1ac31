//! Per-actor glue between the order lifecycle, subscriptions and alerts.
//!
//! An [`ActorSession`] subscribes to the topics the actor's role cares about,
//! routes every change through the [`Dispatcher`](crate::Dispatcher), and,
//! for drivers, keeps the list of orders still open for pickup.

mod actor_session;
mod handler;
pub use actor_session::*;
pub use handler::*;


use crate::Actor;
use crate::ActorRole;
use crate::Table;
use crate::Topic;

/// Topics an actor subscribes to on login.
pub fn topics_for(actor: &Actor) -> Vec<Topic> {
    let messages = Topic::filtered(Table::Messages, "receiver_id", actor.id.clone());
    match actor.role {
        ActorRole::Customer => vec![
            Topic::filtered(Table::Orders, "customer_id", actor.id.clone()),
            messages,
        ],
        ActorRole::RestaurantOwner => match &actor.restaurant_id {
            Some(restaurant_id) => vec![
                Topic::filtered(Table::Orders, "restaurant_id", restaurant_id.clone()),
                messages,
            ],
            None => vec![messages],
        },
        ActorRole::DeliveryDriver => vec![Topic::table(Table::Orders), messages],
        ActorRole::Admin => vec![
            Topic::table(Table::Orders),
            Topic::table(Table::Restaurants),
            messages,
        ],
    }
}
