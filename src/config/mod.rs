//! Configuration management for the order and alert engine.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation

mod dispatch;
mod monitoring;
mod retry;
mod session;
mod storage;
mod subscription;
pub use dispatch::*;
pub use monitoring::*;
pub use retry::*;
pub use session::*;
pub use storage::*;
pub use subscription::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Main configuration container
///
/// Sources are merged in the following order (later sources override earlier):
/// 1. Default values from code
/// 2. Configuration file named by `CONFIG_PATH`
/// 3. Environment variables with `COURIER__` prefix (highest priority)
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct CourierConfig {
    /// Alert classification and channel delivery
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Change feed subscriptions
    #[serde(default)]
    pub subscription: SubscriptionConfig,
    /// Retry policies for backend round trips
    #[serde(default)]
    pub retry: RetryPolicies,
    /// Order persistence
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metrics and logs
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Actor the binary runs a session for
    #[serde(default)]
    pub session: SessionConfig,
}

impl Debug for CourierConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("CourierConfig")
            .field("dispatch", &self.dispatch)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl CourierConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Validation is deferred so that `with_override_config()` can still be
    /// applied. Callers must call `validate()` before using the result.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/courier.toml");
    /// std::env::set_var("COURIER__DISPATCH__DEDUP_WINDOW_MS", "2000");
    /// let cfg = CourierConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(Self::environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from `path`, then the environment again.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.dispatch.validate()?;
        self.subscription.validate()?;
        self.retry.validate()?;
        self.storage.validate()?;
        self.monitoring.validate()?;
        self.session.validate()?;
        Ok(self)
    }

    fn environment() -> Environment {
        Environment::with_prefix("COURIER")
            .separator("__")
            .ignore_empty(true)
            .try_parsing(true)
    }
}
