use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use tracing::info;

use super::OrderPatch;
use super::OrderStore;
use super::WriteGuard;
use crate::constants::ORDERS_TREE;
use crate::Order;
use crate::Result;
use crate::StorageError;

/// Sled-backed store. Conditional writes go through `compare_and_swap`, so a
/// guard is only ever evaluated against the exact bytes being replaced.
#[derive(Debug, Clone)]
pub struct SledOrderStore {
    tree: sled::Tree,
}

pub fn init_sled_order_db(path: impl AsRef<Path>) -> Result<sled::Db> {
    info!("Opening order db at {:?}", path.as_ref());
    let db = sled::Config::default()
        .path(path)
        .use_compression(true)
        .open()?;
    Ok(db)
}

impl SledOrderStore {
    pub fn new(db: &sled::Db) -> Result<Self> {
        let tree = db.open_tree(ORDERS_TREE)?;
        Ok(Self { tree })
    }

    /// Throwaway database removed on drop
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::default().temporary(true).open()?;
        Self::new(&db)
    }

    fn decode(bytes: &[u8]) -> Result<Order> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn encode(order: &Order) -> Result<Vec<u8>> {
        Ok(bincode::serialize(order)?)
    }
}

#[async_trait]
impl OrderStore for SledOrderStore {
    async fn fetch(
        &self,
        order_id: &str,
    ) -> Result<Option<Order>> {
        match self.tree.get(order_id.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn insert(
        &self,
        order: Order,
    ) -> Result<()> {
        let bytes = Self::encode(&order)?;
        match self
            .tree
            .compare_and_swap(order.id.as_bytes(), None as Option<&[u8]>, Some(bytes))?
        {
            Ok(()) => Ok(()),
            Err(_) => Err(StorageError::DuplicateKey(order.id).into()),
        }
    }

    async fn update_if(
        &self,
        order_id: &str,
        guard: WriteGuard,
        patch: OrderPatch,
    ) -> Result<Option<Order>> {
        loop {
            let Some(current) = self.tree.get(order_id.as_bytes())? else {
                return Ok(None);
            };
            let mut order = Self::decode(&current)?;
            if !guard.matches(&order) {
                return Ok(None);
            }
            patch.apply(&mut order);
            let next = Self::encode(&order)?;

            match self
                .tree
                .compare_and_swap(order_id.as_bytes(), Some(&current), Some(next))?
            {
                Ok(()) => return Ok(Some(order)),
                // Row changed between read and swap; evaluate the guard again
                Err(_) => debug!(order_id, "compare_and_swap lost, retrying guard"),
            }
        }
    }

    async fn list_available(&self) -> Result<Vec<Order>> {
        let mut available = Vec::new();
        for item in self.tree.iter() {
            let (_, bytes) = item?;
            let order = Self::decode(&bytes)?;
            if order.is_available_for_pickup() {
                available.push(order);
            }
        }
        available.sort_by_key(|o| o.created_at);
        Ok(available)
    }
}
