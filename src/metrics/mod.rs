use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;


lazy_static! {
    pub static ref ALERTS_DISPATCHED: IntCounterVec = IntCounterVec::new(
        Opts::new("alerts_dispatched", "Alerts delivered, by kind and tier"),
        &["kind", "tier"]
    )
    .expect("metric can not be created");

    pub static ref ALERTS_SUPPRESSED: IntCounterVec = IntCounterVec::new(
        Opts::new("alerts_suppressed", "Change events that produced no alert"),
        &["reason"]
    )
    .expect("metric can not be created");

    pub static ref CHANNEL_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("channel_failures", "Best-effort channel calls that reported failure"),
        &["channel"]
    )
    .expect("metric can not be created");

    pub static ref MODALS_REPLACED: IntCounter =
        IntCounter::new("modals_replaced", "Urgent alerts dropped by a newer modal")
            .expect("metric can not be created");

    pub static ref ORDER_TRANSITIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("order_transitions", "Applied order transitions, by target status"),
        &["to"]
    )
    .expect("metric can not be created");

    pub static ref CLAIM_CONFLICTS: IntCounter =
        IntCounter::new("claim_conflicts", "Claims lost to another driver")
            .expect("metric can not be created");

    pub static ref SUBSCRIPTION_RECONNECTS: IntCounterVec = IntCounterVec::new(
        Opts::new("subscription_reconnects", "Feed channels re-opened after a drop"),
        &["table"]
    )
    .expect("metric can not be created");

    pub static ref ACTIVE_SUBSCRIPTIONS: IntGauge =
        IntGauge::new("active_subscriptions", "Open backend feed channels")
            .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

pub fn register_custom_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ALERTS_DISPATCHED.clone()),
        Box::new(ALERTS_SUPPRESSED.clone()),
        Box::new(CHANNEL_FAILURES.clone()),
        Box::new(MODALS_REPLACED.clone()),
        Box::new(ORDER_TRANSITIONS.clone()),
        Box::new(CLAIM_CONFLICTS.clone()),
        Box::new(SUBSCRIPTION_RECONNECTS.clone()),
        Box::new(ACTIVE_SUBSCRIPTIONS.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            error!("collector can not be registered: {:?}", e);
        }
    }
}

/// Serves `/metrics` until `shutdown_signal` fires.
pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    REGISTER.call_once(|| register_custom_metrics(&REGISTRY));

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    info!("metrics server listening on port {}", port);
    let (_, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    server.await;
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    Ok(gather_text(&REGISTRY))
}

/// Text exposition of everything in `registry`
pub fn gather_text(registry: &Registry) -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
