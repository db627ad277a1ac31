use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Sled,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Database directory for the sled backend
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            db_path: default_db_path(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backend == StorageBackend::Sled && self.db_path.as_os_str().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "storage.db_path is required for the sled backend".into(),
            )));
        }
        Ok(())
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::Memory
}
fn default_db_path() -> PathBuf {
    PathBuf::from("./db/orders")
}
