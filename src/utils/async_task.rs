use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio::time::timeout;
use tracing::error;
use tracing::warn;

use crate::BackoffPolicy;
use crate::Result;
use crate::SystemError;

/// Runs `task` until it succeeds or `policy.max_retries` attempts have
/// failed. Each attempt is bounded by `policy.timeout_ms`; the delay between
/// attempts doubles from `base_delay_ms` up to `max_delay_ms`, with up to 20%
/// random jitter so that many subscriptions dropped together do not reconnect
/// in lockstep.
pub async fn task_with_timeout_and_exponential_backoff<F, T, P>(
    task: F,
    policy: BackoffPolicy,
) -> Result<P>
where
    F: Fn() -> T,
    T: Future<Output = Result<P>>,
{
    let mut attempts = 0;
    let mut delay = policy.base_delay();
    let mut last_error = String::new();

    loop {
        attempts += 1;
        match timeout(policy.timeout(), task()).await {
            Ok(Ok(r)) => return Ok(r),
            Ok(Err(e)) => {
                warn!(attempts, "task failed: {:?}", e);
                last_error = e.to_string();
            }
            Err(_) => {
                warn!(attempts, "task timed out after {:?}", policy.timeout());
                last_error = SystemError::Timeout(policy.timeout()).to_string();
            }
        }

        if policy.max_retries != 0 && attempts >= policy.max_retries {
            warn!("Task failed after {} attempts", attempts);
            return Err(SystemError::RetryExhausted {
                attempts,
                last_error,
            }
            .into());
        }

        sleep(with_jitter(delay)).await;
        delay = (delay * 2).min(policy.max_delay());
    }
}

fn with_jitter(delay: Duration) -> Duration {
    let millis = delay.as_millis() as u64;
    if millis == 0 {
        return delay;
    }
    let jitter = rand::thread_rng().gen_range(0..=millis / 5);
    Duration::from_millis(millis + jitter)
}

/// Spawns a named background task and logs its failure.
pub fn spawn_task<Fut>(
    name: &str,
    fut: Fut,
) -> JoinHandle<()>
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            error!("spawned task: {name} stopped or encountered an error: {:?}", e);
        }
    })
}
