//! Error hierarchy for the order lifecycle and alert dispatch engine.
//!
//! Errors are grouped by the layer that raises them. Only order errors are
//! ever surfaced to a caller as a user-visible failure; channel and
//! subscription errors are logged and absorbed.

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

use crate::OrderStatus;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Runtime-level failures (retry exhaustion, timeouts, task joins)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Order lifecycle violations
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Backend channel lifecycle failures
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    /// Notification adapter failures
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Change feed payload decoding failures
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Order persistence failures
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    /// Target status is not the direct successor of the current one
    #[error("Invalid order transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Acting role is not authorized for the edge
    #[error("Role {role} may not move an order from {from} to {to}")]
    Forbidden {
        role: &'static str,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Another driver won the claim race
    #[error("Order {order_id} was already claimed by another driver")]
    ClaimConflict { order_id: String },

    #[error("Order {order_id} not found")]
    NotFound { order_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    /// Backend channel closed underneath a live subscription
    #[error("Subscription to {topic} dropped")]
    Dropped { topic: String },

    #[error("Failed to connect subscription to {topic}: {reason}")]
    ConnectFailed { topic: String, reason: String },

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Sound, vibration or push adapter reported failure
    #[error("{channel} channel unavailable for alert {alert_id}")]
    Unavailable {
        channel: &'static str,
        alert_id: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    #[error("Unknown table {0}")]
    UnknownTable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    BincodeError(#[from] bincode::Error),

    /// Embedded database errors
    #[error("Embedded database error: {0}")]
    DbError(String),

    #[error("Order {0} already exists")]
    DuplicateKey(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Task failed after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: usize, last_error: String },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("{0}")]
    SignalSendFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(e: sled::Error) -> Self {
        StorageError::DbError(e.to_string())
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Error::Storage(e.into())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Storage(e.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Feed(e.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::System(e.into())
    }
}

impl Error {
    /// Lost the claim race; callers refresh silently instead of reporting.
    pub fn is_claim_conflict(&self) -> bool {
        matches!(self, Error::Order(OrderError::ClaimConflict { .. }))
    }
}
