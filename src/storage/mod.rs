//! OrderStore
//!
//! Persistence seam for orders. The backend owns the rows; the engine only
//! needs point reads and a single conditional write:
//!
//! ```sql
//! UPDATE orders SET status = ?, driver_id = ?, updated_at = ?
//!  WHERE id = ? AND status = ? [AND driver_id IS NULL]
//! ```
//!
//! Zero affected rows is reported as `Ok(None)`, never as an error.

mod mem_order_store;
mod publishing_store;
mod sled_order_store;
pub use mem_order_store::*;
pub use publishing_store::*;
pub use sled_order_store::*;

#[cfg(test)]
mod storage_test;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::ActorId;
use crate::Order;
use crate::OrderStatus;
use crate::Result;

/// WHERE clause of the conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteGuard {
    pub status: OrderStatus,
    /// Additionally require `driver_id IS NULL`
    pub driver_unassigned: bool,
}

impl WriteGuard {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status,
            driver_unassigned: false,
        }
    }

    /// Guard for the claim edge
    pub fn unclaimed() -> Self {
        Self {
            status: OrderStatus::PickupPending,
            driver_unassigned: true,
        }
    }

    pub fn matches(
        &self,
        order: &Order,
    ) -> bool {
        order.status == self.status && (!self.driver_unassigned || order.driver_id.is_none())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverChange {
    Keep,
    Assign(ActorId),
    Clear,
}

/// SET clause of the conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPatch {
    pub status: OrderStatus,
    pub driver: DriverChange,
    pub updated_at: u64,
}

impl OrderPatch {
    pub fn apply(
        &self,
        order: &mut Order,
    ) {
        order.status = self.status;
        match &self.driver {
            DriverChange::Keep => {}
            DriverChange::Assign(driver_id) => order.driver_id = Some(driver_id.clone()),
            DriverChange::Clear => order.driver_id = None,
        }
        order.updated_at = self.updated_at;
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    async fn fetch(
        &self,
        order_id: &str,
    ) -> Result<Option<Order>>;

    /// Fails with `StorageError::DuplicateKey` if the id is taken.
    async fn insert(
        &self,
        order: Order,
    ) -> Result<()>;

    /// Applies `patch` only if the stored row satisfies `guard`, atomically.
    /// Returns the updated row, or `None` when no row matched.
    async fn update_if(
        &self,
        order_id: &str,
        guard: WriteGuard,
        patch: OrderPatch,
    ) -> Result<Option<Order>>;

    /// Orders in `pickup_pending` with no driver, oldest first.
    async fn list_available(&self) -> Result<Vec<Order>>;
}
