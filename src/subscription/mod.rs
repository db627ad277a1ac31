//! Change feed subscriptions, shared per (actor, topic).
//!
//! # Lifecycle
//!
//! ```text
//! open(actor, topic) ──► existing key? ──yes──► add handler
//!                              │no
//!                              ▼
//!                    feed.connect(topic) ──► pump task ──► every handler
//!                                              │ stream ends
//!                                              ▼
//!                          backoff reconnect (on_connectivity_lost once
//!                          per outage, keeps retrying)
//! ```
//!
//! Dropping a [`SubscriptionHandle`] removes its handler; dropping the last
//! one of a key cancels the pump task.

mod manager;
pub use manager::*;


use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::warn;

use crate::ChangeEvent;
use crate::Topic;

/// Receives the events of one subscription, one at a time and in feed order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn on_event(
        &self,
        event: ChangeEvent,
    );

    /// A full reconnect round failed; the subscription keeps retrying and
    /// this is not called again until it has reconnected.
    async fn on_connectivity_lost(
        &self,
        topic: &Topic,
    ) {
        warn!(%topic, "connectivity lost");
    }
}
