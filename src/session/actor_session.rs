use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::instrument;

use super::topics_for;
use super::SessionHandler;
use crate::Actor;
use crate::ActorRole;
use crate::AlertKind;
use crate::Dispatcher;
use crate::Order;
use crate::OrderStateMachine;
use crate::OrderStatus;
use crate::Result;
use crate::SubscriptionConfig;
use crate::SubscriptionHandle;
use crate::SubscriptionManager;

/// One logged-in actor: its live subscriptions and the order operations it
/// performs.
pub struct ActorSession {
    machine: Arc<OrderStateMachine>,
    manager: SubscriptionManager,
    dispatcher: Arc<Dispatcher>,
    handler: Arc<SessionHandler>,
    handles: Vec<SubscriptionHandle>,
    notify_connectivity_loss: bool,
}

impl ActorSession {
    /// Opens the actor's topics; drivers also load the pickup list.
    pub async fn start(
        actor: Actor,
        machine: Arc<OrderStateMachine>,
        manager: SubscriptionManager,
        dispatcher: Arc<Dispatcher>,
        config: &SubscriptionConfig,
    ) -> Result<Self> {
        let handler = Arc::new(SessionHandler::new(
            actor,
            dispatcher.clone(),
            config.notify_connectivity_loss,
        ));
        let mut session = Self {
            machine,
            manager,
            dispatcher,
            handler,
            handles: Vec::new(),
            notify_connectivity_loss: config.notify_connectivity_loss,
        };
        session.subscribe().await?;
        Ok(session)
    }

    pub fn actor(&self) -> &Actor {
        self.handler.actor()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Topics currently held
    pub fn subscription_count(&self) -> usize {
        self.handles.len()
    }

    /// Claims `order_id` for this driver.
    ///
    /// Losing the race refreshes the pickup list silently and returns the
    /// `ClaimConflict`; winning shows a confirmation toast.
    #[instrument(skip(self), fields(driver = %self.actor().id))]
    pub async fn claim(
        &self,
        order_id: &str,
    ) -> Result<Order> {
        match self.machine.claim(order_id, self.actor()).await {
            Ok(order) => {
                self.handler.forget_available(order_id);
                self.dispatcher.notify(
                    AlertKind::Success,
                    "Order claimed",
                    format!("Order #{} is yours; head to the restaurant", order.short_id()),
                );
                Ok(order)
            }
            Err(e) if e.is_claim_conflict() => {
                debug!(order_id, "claim lost, refreshing pickup list");
                self.handler.forget_available(order_id);
                self.refresh_available().await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn transition(
        &self,
        order_id: &str,
        target: OrderStatus,
    ) -> Result<Order> {
        self.machine.transition(order_id, target, self.actor()).await
    }

    pub async fn cancel(
        &self,
        order_id: &str,
    ) -> Result<Order> {
        self.machine.cancel(order_id, self.actor()).await
    }

    /// The driver's cached pickup list; empty for other roles.
    pub fn available_orders(&self) -> Vec<Order> {
        self.handler.available_orders()
    }

    /// Reloads the pickup list from the store.
    pub async fn refresh_available(&self) -> Result<()> {
        if self.actor().role != ActorRole::DeliveryDriver {
            return Ok(());
        }
        let orders = self.machine.available_orders().await?;
        debug!(count = orders.len(), "pickup list refreshed");
        self.handler.replace_available(orders);
        Ok(())
    }

    /// Releases the current subscriptions and resubscribes as `actor`.
    pub async fn switch_role(
        &mut self,
        actor: Actor,
    ) -> Result<()> {
        info!(from = %self.actor().role, to = %actor.role, "switching role");
        self.unsubscribe();
        self.handler = Arc::new(SessionHandler::new(
            actor,
            self.dispatcher.clone(),
            self.notify_connectivity_loss,
        ));
        self.subscribe().await
    }

    /// Logs out this session.
    pub fn end(mut self) {
        self.unsubscribe();
        info!(actor = %self.actor().id, "session ended");
    }

    async fn subscribe(&mut self) -> Result<()> {
        let actor_id = self.actor().id.clone();
        for topic in topics_for(self.actor()) {
            let handle = self.manager.open(&actor_id, topic, self.handler.clone()).await?;
            self.handles.push(handle);
        }
        info!(
            actor = %actor_id,
            role = %self.actor().role,
            topics = self.handles.len(),
            "session subscribed"
        );
        self.refresh_available().await
    }

    /// Releases this session's handles only; other sessions of the same
    /// actor keep their channels.
    fn unsubscribe(&mut self) {
        self.handles.clear();
    }
}
