use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::EventHandler;
use crate::metrics::ACTIVE_SUBSCRIPTIONS;
use crate::metrics::SUBSCRIPTION_RECONNECTS;
use crate::utils::async_task::spawn_task;
use crate::utils::async_task::task_with_timeout_and_exponential_backoff;
use crate::ActorId;
use crate::BackoffPolicy;
use crate::ChangeFeed;
use crate::FeedStream;
use crate::Result;
use crate::SubscriptionError;
use crate::Topic;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub actor_id: ActorId,
    pub topic: Topic,
}

/// Handlers multiplexed onto one backend channel, keyed by handle id
type Handlers = Arc<RwLock<Vec<(u64, Arc<dyn EventHandler>)>>>;

struct Entry {
    handlers: Handlers,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct SubscriptionManagerInner {
    feed: Arc<dyn ChangeFeed>,
    reconnect: BackoffPolicy,
    subscriptions: Mutex<HashMap<SubscriptionKey, Entry>>,
    next_id: AtomicU64,
}

impl SubscriptionManagerInner {
    /// Unregisters the handler behind handle `id`; the last one cancels the
    /// channel.
    fn release(
        &self,
        key: &SubscriptionKey,
        id: u64,
    ) {
        let mut subscriptions = self.subscriptions.lock();
        let Some(entry) = subscriptions.get_mut(key) else {
            return;
        };
        let remaining = {
            let mut handlers = entry.handlers.write();
            let Some(pos) = handlers.iter().position(|(handle_id, _)| *handle_id == id) else {
                // Already torn down by close_actor or shutdown
                return;
            };
            handlers.remove(pos);
            handlers.len()
        };
        if remaining == 0 {
            if let Some(entry) = subscriptions.remove(key) {
                entry.cancel.cancel();
                ACTIVE_SUBSCRIPTIONS.dec();
                debug!(actor = %key.actor_id, topic = %key.topic, "subscription closed");
            }
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Drop for SubscriptionManagerInner {
    fn drop(&mut self) {
        for (_, entry) in self.subscriptions.get_mut().drain() {
            entry.cancel.cancel();
            ACTIVE_SUBSCRIPTIONS.dec();
        }
    }
}

/// Reference to an open subscription.
///
/// Dropping it has the same effect as [`SubscriptionHandle::close`].
pub struct SubscriptionHandle {
    key: SubscriptionKey,
    id: u64,
    manager: Option<Arc<SubscriptionManagerInner>>,
}

impl SubscriptionHandle {
    pub fn key(&self) -> &SubscriptionKey {
        &self.key
    }

    pub fn topic(&self) -> &Topic {
        &self.key.topic
    }

    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(manager) = self.manager.take() {
            manager.release(&self.key, self.id);
            trace!(topic = %self.key.topic, id = self.id, "handle released");
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("open", &self.manager.is_some())
            .finish()
    }
}

/// Owns every backend channel opened on behalf of actors.
///
/// Cloning is cheap and shares the same set of channels.
#[derive(Clone)]
pub struct SubscriptionManager {
    inner: Arc<SubscriptionManagerInner>,
}

impl SubscriptionManager {
    pub fn new(
        feed: Arc<dyn ChangeFeed>,
        reconnect: BackoffPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(SubscriptionManagerInner {
                feed,
                reconnect,
                subscriptions: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Subscribes `actor_id` to `topic`.
    ///
    /// Opens of the same (actor, topic) share one backend channel; every
    /// registered handler receives each event, in registration order.
    pub async fn open(
        &self,
        actor_id: &str,
        topic: Topic,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionHandle> {
        let key = SubscriptionKey {
            actor_id: actor_id.to_string(),
            topic,
        };

        if let Some(handle) = self.share(&key, &handler) {
            return Ok(handle);
        }

        let stream = self.inner.feed.connect(&key.topic).await?;

        let mut subscriptions = self.inner.subscriptions.lock();
        // Lost a race with a concurrent open of the same key while
        // connecting; the extra stream is dropped
        if let Some(entry) = subscriptions.get(&key) {
            let id = self.register(entry, &handler);
            drop(subscriptions);
            return Ok(self.handle(key, id));
        }

        let id = self.inner.next_id();
        let handlers: Handlers = Arc::new(RwLock::new(vec![(id, handler)]));
        let cancel = CancellationToken::new();
        let task = spawn_task(
            "subscription",
            pump(
                self.inner.feed.clone(),
                key.topic.clone(),
                handlers.clone(),
                stream,
                cancel.clone(),
                self.inner.reconnect,
            ),
        );
        subscriptions.insert(
            key.clone(),
            Entry {
                handlers,
                cancel,
                task,
            },
        );
        ACTIVE_SUBSCRIPTIONS.inc();
        drop(subscriptions);

        info!(actor = %key.actor_id, topic = %key.topic, "subscription opened");
        Ok(self.handle(key, id))
    }

    pub fn close(
        &self,
        handle: SubscriptionHandle,
    ) {
        handle.close();
    }

    /// Tears down every subscription of `actor_id` regardless of outstanding
    /// handles. Returns how many channels were closed.
    pub fn close_actor(
        &self,
        actor_id: &str,
    ) -> usize {
        let mut subscriptions = self.inner.subscriptions.lock();
        let keys: Vec<SubscriptionKey> = subscriptions
            .keys()
            .filter(|k| k.actor_id == actor_id)
            .cloned()
            .collect();
        for key in &keys {
            if let Some(entry) = subscriptions.remove(key) {
                entry.cancel.cancel();
                ACTIVE_SUBSCRIPTIONS.dec();
            }
        }
        debug!(actor = actor_id, closed = keys.len(), "actor subscriptions closed");
        keys.len()
    }

    /// Cancels every channel and waits for their tasks to finish.
    pub async fn shutdown(&self) {
        let entries: Vec<Entry> = {
            let mut subscriptions = self.inner.subscriptions.lock();
            subscriptions.drain().map(|(_, entry)| entry).collect()
        };
        for entry in &entries {
            entry.cancel.cancel();
            ACTIVE_SUBSCRIPTIONS.dec();
        }
        for entry in entries {
            if let Err(e) = entry.task.await {
                warn!("subscription task join failed: {:?}", e);
            }
        }
        info!("subscription manager shut down");
    }

    /// Outstanding handles on (actor, topic); 0 when not open.
    pub fn ref_count(
        &self,
        actor_id: &str,
        topic: &Topic,
    ) -> usize {
        let key = SubscriptionKey {
            actor_id: actor_id.to_string(),
            topic: topic.clone(),
        };
        self.inner
            .subscriptions
            .lock()
            .get(&key)
            .map(|e| e.handlers.read().len())
            .unwrap_or(0)
    }

    /// Open backend channels
    pub fn active_count(&self) -> usize {
        self.inner.subscriptions.lock().len()
    }

    fn share(
        &self,
        key: &SubscriptionKey,
        handler: &Arc<dyn EventHandler>,
    ) -> Option<SubscriptionHandle> {
        let subscriptions = self.inner.subscriptions.lock();
        let entry = subscriptions.get(key)?;
        let id = self.register(entry, handler);
        trace!(topic = %key.topic, ref_count = entry.handlers.read().len(), "subscription shared");
        drop(subscriptions);
        Some(self.handle(key.clone(), id))
    }

    fn register(
        &self,
        entry: &Entry,
        handler: &Arc<dyn EventHandler>,
    ) -> u64 {
        let id = self.inner.next_id();
        entry.handlers.write().push((id, handler.clone()));
        id
    }

    fn handle(
        &self,
        key: SubscriptionKey,
        id: u64,
    ) -> SubscriptionHandle {
        SubscriptionHandle {
            key,
            id,
            manager: Some(self.inner.clone()),
        }
    }
}

/// Feeds `stream` into every registered handler until cancelled,
/// reconnecting whenever the backend drops the channel.
async fn pump(
    feed: Arc<dyn ChangeFeed>,
    topic: Topic,
    handlers: Handlers,
    mut stream: FeedStream,
    cancel: CancellationToken,
    policy: BackoffPolicy,
) -> Result<()> {
    loop {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                next = stream.next() => match next {
                    Some(event) => {
                        for handler in snapshot(&handlers) {
                            handler.on_event(event.clone()).await;
                        }
                    }
                    None => break,
                },
            }
        }

        warn!(
            "{}",
            SubscriptionError::Dropped {
                topic: topic.to_string()
            }
        );
        stream = match reconnect(&feed, &topic, &handlers, &cancel, policy).await {
            Some(stream) => stream,
            None => return Ok(()),
        };
    }
}

fn snapshot(handlers: &Handlers) -> Vec<Arc<dyn EventHandler>> {
    handlers.read().iter().map(|(_, handler)| handler.clone()).collect()
}

/// Retries `connect` in backoff rounds until it succeeds or `cancel` fires.
/// Handlers hear about the outage once, after the first failed round.
async fn reconnect(
    feed: &Arc<dyn ChangeFeed>,
    topic: &Topic,
    handlers: &Handlers,
    cancel: &CancellationToken,
    policy: BackoffPolicy,
) -> Option<FeedStream> {
    let mut notified = false;
    loop {
        let attempt = task_with_timeout_and_exponential_backoff(|| feed.connect(topic), policy);
        tokio::select! {
            _ = cancel.cancelled() => return None,
            result = attempt => match result {
                Ok(stream) => {
                    SUBSCRIPTION_RECONNECTS.with_label_values(&[topic.table.as_str()]).inc();
                    info!(%topic, "subscription reconnected");
                    return Some(stream);
                }
                Err(e) => {
                    warn!(%topic, "reconnect round failed: {:?}", e);
                    if !notified {
                        notified = true;
                        for handler in snapshot(handlers) {
                            handler.on_connectivity_lost(topic).await;
                        }
                    }
                }
            },
        }
    }
}
