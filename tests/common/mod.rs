use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;

use courier_engine::channel::ChannelSet;
use courier_engine::channel::RecordingChannel;
use courier_engine::Actor;
use courier_engine::ActorSession;
use courier_engine::BackoffPolicy;
use courier_engine::DispatchConfig;
use courier_engine::Dispatcher;
use courier_engine::FeedPublishingStore;
use courier_engine::LocalChangeFeed;
use courier_engine::MemOrderStore;
use courier_engine::Order;
use courier_engine::OrderStateMachine;
use courier_engine::OrderStatus;
use courier_engine::RecipientProfile;
use courier_engine::SubscriptionConfig;
use courier_engine::SubscriptionManager;
use tokio::time::sleep;
use tokio::time::timeout;

pub const WAIT_TIMEOUT_IN_SEC: u64 = 3;

static LOGGER_INIT: Once = Once::new();

pub fn enable_logger() {
    LOGGER_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// One in-process backend: order store publishing onto a local feed, plus
/// the subscription manager every session shares.
pub struct TestContext {
    pub feed: Arc<LocalChangeFeed>,
    pub machine: Arc<OrderStateMachine>,
    pub manager: SubscriptionManager,
    pub subscription: SubscriptionConfig,
}

impl TestContext {
    pub fn new(replay_capacity: usize) -> Self {
        enable_logger();
        let subscription = SubscriptionConfig {
            feed_buffer_size: 128,
            replay_capacity,
            notify_connectivity_loss: true,
        };
        let feed = Arc::new(LocalChangeFeed::from_config(&subscription));
        let store = Arc::new(FeedPublishingStore::new(
            Arc::new(MemOrderStore::new()),
            feed.clone(),
        ));
        Self {
            machine: Arc::new(OrderStateMachine::new(store)),
            manager: SubscriptionManager::new(feed.clone(), fast_reconnect()),
            feed,
            subscription,
        }
    }

    pub async fn start_session(
        &self,
        actor: Actor,
        profile: RecipientProfile,
    ) -> (ActorSession, Arc<RecordingChannel>) {
        let recorder = Arc::new(RecordingChannel::new());
        let dispatcher = Arc::new(Dispatcher::new(
            ChannelSet::recording(recorder.clone()),
            &DispatchConfig::default(),
            profile,
        ));
        let session = ActorSession::start(
            actor,
            self.machine.clone(),
            self.manager.clone(),
            dispatcher,
            &self.subscription,
        )
        .await
        .expect("session starts");
        (session, recorder)
    }

    /// Places `id` for `rest-1` and walks it to `pickup_pending`.
    pub async fn ready_for_pickup(
        &self,
        id: &str,
    ) {
        self.place(id).await;
        let owner = Actor::restaurant_owner("owner-1", "rest-1");
        for status in [OrderStatus::Accepted, OrderStatus::Preparing, OrderStatus::PickupPending] {
            self.machine.transition(id, status, &owner).await.unwrap();
        }
    }

    pub async fn place(
        &self,
        id: &str,
    ) -> Order {
        self.machine
            .place(Order::new(id, "cust-1", "rest-1", 2450, "12 Harbour Rd"))
            .await
            .unwrap()
    }

    pub async fn shutdown(self) {
        self.manager.shutdown().await;
    }
}

pub fn fast_reconnect() -> BackoffPolicy {
    BackoffPolicy {
        max_retries: 3,
        timeout_ms: 200,
        base_delay_ms: 1,
        max_delay_ms: 10,
    }
}

pub async fn wait_until(cond: impl Fn() -> bool) {
    timeout(Duration::from_secs(WAIT_TIMEOUT_IN_SEC), async {
        while !cond() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
