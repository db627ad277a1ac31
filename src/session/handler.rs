use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use tracing::trace;

use crate::Actor;
use crate::ActorRole;
use crate::AlertKind;
use crate::ChangeEvent;
use crate::DispatchOutcome;
use crate::Dispatcher;
use crate::EventHandler;
use crate::Order;
use crate::OrderId;
use crate::Topic;

/// Event handler shared by all subscriptions of one session.
pub struct SessionHandler {
    actor: Actor,
    dispatcher: Arc<Dispatcher>,
    /// Orders open for pickup, kept for drivers only
    available: DashMap<OrderId, Order>,
    notify_connectivity_loss: bool,
}

impl SessionHandler {
    pub fn new(
        actor: Actor,
        dispatcher: Arc<Dispatcher>,
        notify_connectivity_loss: bool,
    ) -> Self {
        Self {
            actor,
            dispatcher,
            available: DashMap::new(),
            notify_connectivity_loss,
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Oldest first
    pub fn available_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.available.iter().map(|e| e.value().clone()).collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        orders
    }

    pub(crate) fn replace_available(
        &self,
        orders: Vec<Order>,
    ) {
        self.available.clear();
        for order in orders {
            self.available.insert(order.id.clone(), order);
        }
    }

    pub(crate) fn forget_available(
        &self,
        order_id: &str,
    ) {
        self.available.remove(order_id);
    }

    fn track_availability(
        &self,
        event: &ChangeEvent,
    ) {
        if self.actor.role != ActorRole::DeliveryDriver {
            return;
        }
        if let Some(order) = event.new_order() {
            if order.is_available_for_pickup() {
                self.available.insert(order.id.clone(), order.clone());
            } else {
                self.available.remove(&order.id);
            }
        }
    }
}

#[async_trait]
impl EventHandler for SessionHandler {
    async fn on_event(
        &self,
        event: ChangeEvent,
    ) {
        self.track_availability(&event);
        match self.dispatcher.dispatch(&event, &self.actor) {
            DispatchOutcome::Delivered(report) => {
                trace!(actor = %self.actor.id, alert = %report.alert_id, "alert dispatched")
            }
            outcome => trace!(actor = %self.actor.id, ?outcome, "no alert"),
        }
    }

    async fn on_connectivity_lost(
        &self,
        topic: &Topic,
    ) {
        debug!(actor = %self.actor.id, %topic, "connectivity lost");
        if self.notify_connectivity_loss {
            self.dispatcher.notify(
                AlertKind::Error,
                "Connection lost",
                "Live updates are reconnecting; some changes may show up late",
            );
        }
    }
}
