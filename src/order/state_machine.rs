use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use super::authorize;
use super::classify_edge;
use super::Actor;
use super::Edge;
use super::Order;
use super::OrderStatus;
use crate::constants::MAX_TRANSITION_ATTEMPTS;
use crate::metrics::CLAIM_CONFLICTS;
use crate::metrics::ORDER_TRANSITIONS;
use crate::time::now_millis;
use crate::DriverChange;
use crate::OrderError;
use crate::OrderPatch;
use crate::OrderStore;
use crate::Result;
use crate::WriteGuard;

/// Validates and applies order status transitions.
///
/// Every write is conditional on the status that was validated, so a
/// transition never overwrites a row that moved in the meantime. The claim
/// edge additionally requires `driver_id IS NULL` and is never retried.
pub struct OrderStateMachine {
    store: Arc<dyn OrderStore>,
}

impl OrderStateMachine {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// Checkout hook: persists a new `pending` order.
    pub async fn place(
        &self,
        order: Order,
    ) -> Result<Order> {
        if order.status != OrderStatus::Pending || order.driver_id.is_some() {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Pending,
            }
            .into());
        }
        self.store.insert(order.clone()).await?;
        info!(order_id = %order.id, restaurant_id = %order.restaurant_id, "order placed");
        Ok(order)
    }

    pub async fn fetch(
        &self,
        order_id: &str,
    ) -> Result<Order> {
        self.store.fetch(order_id).await?.ok_or_else(|| {
            OrderError::NotFound {
                order_id: order_id.to_string(),
            }
            .into()
        })
    }

    /// Moves `order_id` to `target` on behalf of `actor`.
    ///
    /// # Errors
    /// - `InvalidTransition` when `target` is not the direct successor
    /// - `Forbidden` when the actor may not take this edge
    /// - `ClaimConflict` when another driver holds or just took the order
    /// - `NotFound` for unknown ids
    #[instrument(skip(self, actor), fields(actor_id = %actor.id, role = %actor.role))]
    pub async fn transition(
        &self,
        order_id: &str,
        target: OrderStatus,
        actor: &Actor,
    ) -> Result<Order> {
        let mut order = self.fetch(order_id).await?;

        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            if target == OrderStatus::PickupAccepted {
                return self.claim_order(order, actor).await;
            }

            let edge = classify_edge(order.status, target)?;
            authorize(&order, target, actor)?;

            let driver = match edge {
                Edge::AlreadyCancelled => {
                    debug!(order_id, "order already cancelled");
                    return Ok(order);
                }
                Edge::Cancel => DriverChange::Clear,
                Edge::Advance | Edge::Claim => DriverChange::Keep,
            };

            let from = order.status;
            let patch = OrderPatch {
                status: target,
                driver,
                updated_at: now_millis(),
            };
            if let Some(updated) = self
                .store
                .update_if(order_id, WriteGuard::status(from), patch)
                .await?
            {
                ORDER_TRANSITIONS.with_label_values(&[target.as_str()]).inc();
                info!(order_id, %from, to = %target, "order transitioned");
                return Ok(updated);
            }

            debug!(order_id, attempt, "order moved underneath, re-validating");
            order = self.fetch(order_id).await?;
        }

        warn!(order_id, to = %target, "giving up after repeated write conflicts");
        Err(OrderError::InvalidTransition {
            from: order.status,
            to: target,
        }
        .into())
    }

    /// Binds `driver` to a `pickup_pending` order with one conditional write.
    pub async fn claim(
        &self,
        order_id: &str,
        driver: &Actor,
    ) -> Result<Order> {
        self.transition(order_id, OrderStatus::PickupAccepted, driver).await
    }

    /// Cancels from any non-terminal status. Cancelling a cancelled order
    /// is a successful no-op.
    pub async fn cancel(
        &self,
        order_id: &str,
        actor: &Actor,
    ) -> Result<Order> {
        self.transition(order_id, OrderStatus::Cancelled, actor).await
    }

    /// Orders any driver may claim right now.
    pub async fn available_orders(&self) -> Result<Vec<Order>> {
        self.store.list_available().await
    }

    async fn claim_order(
        &self,
        order: Order,
        driver: &Actor,
    ) -> Result<Order> {
        authorize(&order, OrderStatus::PickupAccepted, driver)?;

        if order.status != OrderStatus::PickupPending {
            if order.driver_id.is_some() {
                return Err(self.conflict(&order.id, driver));
            }
            classify_edge(order.status, OrderStatus::PickupAccepted)?;
        }

        let patch = OrderPatch {
            status: OrderStatus::PickupAccepted,
            driver: DriverChange::Assign(driver.id.clone()),
            updated_at: now_millis(),
        };
        match self
            .store
            .update_if(&order.id, WriteGuard::unclaimed(), patch)
            .await?
        {
            Some(claimed) => {
                ORDER_TRANSITIONS
                    .with_label_values(&[OrderStatus::PickupAccepted.as_str()])
                    .inc();
                info!(order_id = %claimed.id, driver_id = %driver.id, "order claimed");
                Ok(claimed)
            }
            None => Err(self.conflict(&order.id, driver)),
        }
    }

    fn conflict(
        &self,
        order_id: &str,
        driver: &Actor,
    ) -> crate::Error {
        CLAIM_CONFLICTS.inc();
        debug!(order_id, driver_id = %driver.id, "claim lost");
        OrderError::ClaimConflict {
            order_id: order_id.to_string(),
        }
        .into()
    }
}
