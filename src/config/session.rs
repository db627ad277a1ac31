use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Actor;
use crate::ActorRole;
use crate::Error;
use crate::RecipientProfile;
use crate::Result;

/// Actor the binary opens a session for, and that actor's alert settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_actor_id")]
    pub actor_id: String,

    #[serde(default = "default_role")]
    pub role: ActorRole,

    #[serde(default)]
    pub restaurant_id: Option<String>,

    #[serde(default)]
    pub profile: RecipientProfile,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            actor_id: default_actor_id(),
            role: default_role(),
            restaurant_id: None,
            profile: RecipientProfile::default(),
        }
    }
}

impl SessionConfig {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.actor_id.clone(),
            role: self.role,
            restaurant_id: self.restaurant_id.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.actor_id.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "session.actor_id cannot be empty".into(),
            )));
        }
        if self.role == ActorRole::RestaurantOwner && self.restaurant_id.is_none() {
            return Err(Error::Config(ConfigError::Message(
                "session.restaurant_id is required for restaurant_owner".into(),
            )));
        }
        self.profile.validate()
    }
}

fn default_actor_id() -> String {
    "admin".to_string()
}
fn default_role() -> ActorRole {
    ActorRole::Admin
}
