use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use futures::future;
use futures::stream;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use super::ChangeEvent;
use super::ChangeFeed;
use super::FeedStream;
use super::Topic;
use crate::Result;
use crate::SubscriptionConfig;
use crate::SubscriptionError;

/// In-process change feed.
///
/// Events published here fan out to every connected topic stream. It can
/// also simulate what a hosted backend does under stress: dropping every open
/// channel at once, refusing connections, and replaying recent rows to a
/// stream that reconnects.
pub struct LocalChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
    /// Cancelled to drop every stream connected so far
    epoch: Mutex<CancellationToken>,
    history: Mutex<VecDeque<ChangeEvent>>,
    replay_capacity: usize,
    refuse_connects: AtomicUsize,
    connects: AtomicUsize,
}

impl LocalChangeFeed {
    pub fn new(
        buffer_size: usize,
        replay_capacity: usize,
    ) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self {
            sender,
            epoch: Mutex::new(CancellationToken::new()),
            history: Mutex::new(VecDeque::with_capacity(replay_capacity)),
            replay_capacity,
            refuse_connects: AtomicUsize::new(0),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &SubscriptionConfig) -> Self {
        Self::new(config.feed_buffer_size, config.replay_capacity)
    }

    /// Fans `event` out to connected streams; returns how many received it.
    pub fn publish(
        &self,
        event: ChangeEvent,
    ) -> usize {
        if self.replay_capacity > 0 {
            let mut history = self.history.lock();
            if history.len() == self.replay_capacity {
                history.pop_front();
            }
            history.push_back(event.clone());
        }
        self.sender.send(event).unwrap_or(0)
    }

    /// Ends every stream connected so far, as a backend restart would.
    pub fn disconnect_all(&self) {
        let mut epoch = self.epoch.lock();
        epoch.cancel();
        *epoch = CancellationToken::new();
        debug!("local feed dropped all channels");
    }

    /// Makes the next `n` connection attempts fail.
    pub fn refuse_next_connects(
        &self,
        n: usize,
    ) {
        self.refuse_connects.store(n, Ordering::SeqCst);
    }

    /// Successful connects since creation.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl ChangeFeed for LocalChangeFeed {
    async fn connect(
        &self,
        topic: &Topic,
    ) -> Result<FeedStream> {
        let refused = self
            .refuse_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(SubscriptionError::ConnectFailed {
                topic: topic.to_string(),
                reason: "connection refused".into(),
            }
            .into());
        }

        // Subscribe before snapshotting history so nothing falls in between;
        // overlap shows up as a redelivery.
        let receiver = self.sender.subscribe();
        let replay: Vec<ChangeEvent> = self
            .history
            .lock()
            .iter()
            .filter(|e| topic.matches(e))
            .cloned()
            .collect();
        let closed = self.epoch.lock().clone();
        self.connects.fetch_add(1, Ordering::SeqCst);

        let live_topic = topic.clone();
        let live = BroadcastStream::new(receiver).filter_map(move |item| {
            let event = match item {
                Ok(event) if live_topic.matches(&event) => Some(event),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(topic = %live_topic, skipped, "feed consumer lagged");
                    None
                }
            };
            future::ready(event)
        });

        let stream = stream::iter(replay)
            .chain(live)
            .take_until(closed.cancelled_owned());
        Ok(Box::pin(stream))
    }
}
