use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushPermission {
    Granted,
    Denied,
    /// Not asked yet
    Default,
}

/// A recipient's channel preferences, as set on the settings surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientProfile {
    #[serde(default = "default_enabled")]
    pub sound_enabled: bool,
    #[serde(default = "default_enabled")]
    pub vibration_enabled: bool,
    #[serde(default = "default_enabled")]
    pub push_enabled: bool,
    #[serde(default = "default_push_permission")]
    pub push_permission: PushPermission,
    /// 0..=100
    #[serde(default = "default_volume")]
    pub volume: u8,
}

impl Default for RecipientProfile {
    fn default() -> Self {
        Self {
            sound_enabled: default_enabled(),
            vibration_enabled: default_enabled(),
            push_enabled: default_enabled(),
            push_permission: default_push_permission(),
            volume: default_volume(),
        }
    }
}

impl RecipientProfile {
    /// Everything off; urgent alerts still reach forced channels.
    pub fn muted() -> Self {
        Self {
            sound_enabled: false,
            vibration_enabled: false,
            push_enabled: false,
            ..Self::default()
        }
    }

    pub fn with_volume(
        mut self,
        volume: u8,
    ) -> Self {
        self.volume = volume.min(100);
        self
    }

    pub fn with_push_permission(
        mut self,
        permission: PushPermission,
    ) -> Self {
        self.push_permission = permission;
        self
    }

    pub fn wants_sound(&self) -> bool {
        self.sound_enabled && self.volume > 0
    }

    pub fn wants_push(&self) -> bool {
        self.push_enabled && self.push_permission == PushPermission::Granted
    }

    pub fn validate(&self) -> Result<()> {
        if self.volume > 100 {
            return Err(Error::Config(ConfigError::Message(format!(
                "profile.volume must be within 0..=100, got {}",
                self.volume
            ))));
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}
fn default_push_permission() -> PushPermission {
    PushPermission::Default
}
fn default_volume() -> u8 {
    80
}
