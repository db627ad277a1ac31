//! # courier-engine
//!
//! Order lifecycle and real-time alerting for a food delivery platform.
//!
//! - [`OrderStateMachine`]: strict status progression with an exclusive
//!   driver claim, written as a single conditional store update
//! - [`SubscriptionManager`]: reference-counted change feed subscriptions
//!   with backoff reconnection
//! - [`Dispatcher`]: classifies row changes per viewer and delivers alerts on
//!   the channel adapters by tier
//! - [`ActorSession`]: ties the three together for one logged-in actor

pub mod alert;
pub mod channel;
mod config;
pub mod constants;
mod errors;
pub mod feed;
mod metrics;
pub mod order;
pub mod session;
pub mod storage;
pub mod subscription;
pub mod utils;

pub use alert::*;
pub use channel::*;
pub use config::*;
pub use errors::*;
pub use feed::*;
pub use metrics::*;
pub use order::*;
pub use session::*;
pub use storage::*;
pub use subscription::*;
pub use utils::*;
