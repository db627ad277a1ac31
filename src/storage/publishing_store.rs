use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use super::OrderPatch;
use super::OrderStore;
use super::WriteGuard;
use crate::ChangeEvent;
use crate::LocalChangeFeed;
use crate::Order;
use crate::Result;
use crate::Row;

/// Store decorator that announces every successful write on a
/// [`LocalChangeFeed`], the way the hosted backend emits row changes.
///
/// Updates are published without an `old` row, matching backends that only
/// ship the primary key.
pub struct FeedPublishingStore {
    inner: Arc<dyn OrderStore>,
    feed: Arc<LocalChangeFeed>,
}

impl FeedPublishingStore {
    pub fn new(
        inner: Arc<dyn OrderStore>,
        feed: Arc<LocalChangeFeed>,
    ) -> Self {
        Self { inner, feed }
    }
}

#[async_trait]
impl OrderStore for FeedPublishingStore {
    async fn fetch(
        &self,
        order_id: &str,
    ) -> Result<Option<Order>> {
        self.inner.fetch(order_id).await
    }

    async fn insert(
        &self,
        order: Order,
    ) -> Result<()> {
        self.inner.insert(order.clone()).await?;
        let receivers = self.feed.publish(ChangeEvent::insert(Row::Order(order)));
        trace!(receivers, "order insert published");
        Ok(())
    }

    async fn update_if(
        &self,
        order_id: &str,
        guard: WriteGuard,
        patch: OrderPatch,
    ) -> Result<Option<Order>> {
        let updated = self.inner.update_if(order_id, guard, patch).await?;
        if let Some(order) = &updated {
            let receivers = self.feed.publish(ChangeEvent::update(None, Row::Order(order.clone())));
            trace!(order_id, receivers, "order update published");
        }
        Ok(updated)
    }

    async fn list_available(&self) -> Result<Vec<Order>> {
        self.inner.list_available().await
    }
}
