use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Engine-wide switches for the failable channels.
///
/// Turning a channel off here is the explicit global disable: it silences the
/// channel even for urgent alerts, which otherwise ignore per-user mutes.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSwitches {
    #[serde(default = "default_enabled")]
    pub sound: bool,
    #[serde(default = "default_enabled")]
    pub vibration: bool,
    #[serde(default = "default_enabled")]
    pub push: bool,
}

impl Default for ChannelSwitches {
    fn default() -> Self {
        Self {
            sound: default_enabled(),
            vibration: default_enabled(),
            push: default_enabled(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DispatchConfig {
    /// How long a (table, row id, status) key suppresses redeliveries
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: u64,

    /// Upper bound on remembered keys; expired keys are evicted first
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,

    #[serde(default)]
    pub channels: ChannelSwitches,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: default_dedup_window_ms(),
            dedup_capacity: default_dedup_capacity(),
            channels: ChannelSwitches::default(),
        }
    }
}

impl DispatchConfig {
    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dedup_window_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "dispatch.dedup_window_ms must be greater than 0".into(),
            )));
        }
        if self.dedup_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "dispatch.dedup_capacity must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}
// in ms
fn default_dedup_window_ms() -> u64 {
    5_000
}
fn default_dedup_capacity() -> usize {
    1024
}
