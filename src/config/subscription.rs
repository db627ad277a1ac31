use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubscriptionConfig {
    /// Capacity of the in-process feed's broadcast buffer
    #[serde(default = "default_feed_buffer_size")]
    pub feed_buffer_size: usize,

    /// Recent events the in-process feed replays to a reconnecting stream
    #[serde(default)]
    pub replay_capacity: usize,

    /// Surface a connectivity toast when reconnection keeps failing
    #[serde(default = "default_notify_connectivity_loss")]
    pub notify_connectivity_loss: bool,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            feed_buffer_size: default_feed_buffer_size(),
            replay_capacity: 0,
            notify_connectivity_loss: default_notify_connectivity_loss(),
        }
    }
}

impl SubscriptionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.feed_buffer_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "subscription.feed_buffer_size must be greater than 0".into(),
            )));
        }
        if self.replay_capacity > self.feed_buffer_size {
            return Err(Error::Config(ConfigError::Message(format!(
                "subscription.replay_capacity ({}) exceeds feed_buffer_size ({})",
                self.replay_capacity, self.feed_buffer_size
            ))));
        }
        Ok(())
    }
}

fn default_feed_buffer_size() -> usize {
    256
}
fn default_notify_connectivity_loss() -> bool {
    true
}
