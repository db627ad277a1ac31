use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::trace;

use super::OrderPatch;
use super::OrderStore;
use super::WriteGuard;
use crate::Order;
use crate::Result;
use crate::StorageError;

/// In-process store. The guard check and the write happen under the
/// DashMap shard lock of the row, so a conditional write is atomic.
#[derive(Debug, Default)]
pub struct MemOrderStore {
    orders: DashMap<String, Order>,
}

impl MemOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderStore for MemOrderStore {
    async fn fetch(
        &self,
        order_id: &str,
    ) -> Result<Option<Order>> {
        Ok(self.orders.get(order_id).map(|o| o.value().clone()))
    }

    async fn insert(
        &self,
        order: Order,
    ) -> Result<()> {
        match self.orders.entry(order.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::DuplicateKey(order.id).into()),
            Entry::Vacant(slot) => {
                slot.insert(order);
                Ok(())
            }
        }
    }

    async fn update_if(
        &self,
        order_id: &str,
        guard: WriteGuard,
        patch: OrderPatch,
    ) -> Result<Option<Order>> {
        let Some(mut row) = self.orders.get_mut(order_id) else {
            return Ok(None);
        };
        if !guard.matches(&row) {
            trace!(order_id, ?guard, current = %row.status, "conditional write matched no row");
            return Ok(None);
        }
        patch.apply(&mut row);
        Ok(Some(row.value().clone()))
    }

    async fn list_available(&self) -> Result<Vec<Order>> {
        let mut available: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.is_available_for_pickup())
            .map(|o| o.value().clone())
            .collect();
        available.sort_by_key(|o| o.created_at);
        Ok(available)
    }
}
