use std::path::Path;
use std::sync::Arc;

use courier_engine::file_io::open_file_for_append;
use courier_engine::init_sled_order_db;
use courier_engine::start_server;
use courier_engine::ActorSession;
use courier_engine::ChangeEvent;
use courier_engine::ChannelSet;
use courier_engine::CourierConfig;
use courier_engine::Dispatcher;
use courier_engine::FeedPublishingStore;
use courier_engine::LocalChangeFeed;
use courier_engine::MemOrderStore;
use courier_engine::OrderStateMachine;
use courier_engine::OrderStore;
use courier_engine::Result;
use courier_engine::SledOrderStore;
use courier_engine::StorageBackend;
use courier_engine::StorageConfig;
use courier_engine::SubscriptionManager;
use courier_engine::SystemError;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = CourierConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.monitoring.log_dir)?;

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    if settings.monitoring.prometheus_enabled {
        tokio::spawn(start_server(settings.monitoring.prometheus_port, graceful_rx.clone()));
    }

    let feed = Arc::new(LocalChangeFeed::from_config(&settings.subscription));
    let store = Arc::new(FeedPublishingStore::new(build_store(&settings.storage)?, feed.clone()));
    let machine = Arc::new(OrderStateMachine::new(store));
    let manager = SubscriptionManager::new(feed.clone(), settings.retry.reconnect);
    let dispatcher = Arc::new(Dispatcher::new(
        ChannelSet::logging(),
        &settings.dispatch,
        settings.session.profile.clone(),
    ));

    let session = ActorSession::start(
        settings.session.actor(),
        machine,
        manager.clone(),
        dispatcher,
        &settings.subscription,
    )
    .await?;

    info!("Application started. Reading change events from stdin...");
    // Listen on Shutdown Signal
    tokio::spawn(async {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    let mut shutdown = graceful_rx.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            line = lines.next_line() => match line? {
                Some(line) => publish_line(&feed, &line),
                None => {
                    info!("stdin closed");
                    break;
                }
            },
        }
    }

    session.end();
    manager.shutdown().await;
    info!("Exiting program.");
    Ok(())
}

fn publish_line(
    feed: &LocalChangeFeed,
    line: &str,
) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match ChangeEvent::from_json(line) {
        Ok(event) => {
            let receivers = feed.publish(event);
            info!(receivers, "change event published");
        }
        Err(e) => warn!("skipping malformed change event: {:?}", e),
    }
}

fn build_store(config: &StorageConfig) -> Result<Arc<dyn OrderStore>> {
    let store: Arc<dyn OrderStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemOrderStore::new()),
        StorageBackend::Sled => {
            let db = init_sled_order_db(&config.db_path)?;
            Arc::new(SledOrderStore::new(&db)?)
        }
    };
    Ok(store)
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }

    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        SystemError::SignalSendFailed(format!("Failed to send shutdown signal: {}", e))
    })?;

    info!("Shutdown completed");
    Ok(())
}

pub fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    let log_file = open_file_for_append(&log_dir.join("courier.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
