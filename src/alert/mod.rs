//! Alert classification and dispatch.
//!
//! A change event becomes at most one [`AlertEvent`] per viewer
//! ([`classify`]); the [`Dispatcher`] then realizes it on the channel
//! adapters according to the alert's tier and the viewer's
//! [`RecipientProfile`].

mod classifier;
mod dedup;
mod dispatcher;
mod profile;
pub use classifier::*;
pub use dedup::*;
pub use dispatcher::*;
pub use profile::*;

#[cfg(test)]
mod classifier_test;

use std::fmt;

use crate::ActorRole;
use crate::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    NewOrder,
    StatusChanged,
    DeliveryAvailable,
    NewMessage,
    AdminUrgent,
    Success,
    Error,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::NewOrder => "new_order",
            AlertKind::StatusChanged => "status_changed",
            AlertKind::DeliveryAvailable => "delivery_available",
            AlertKind::NewMessage => "new_message",
            AlertKind::AdminUrgent => "admin_urgent",
            AlertKind::Success => "success",
            AlertKind::Error => "error",
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            AlertKind::NewOrder | AlertKind::AdminUrgent => Tier::Urgent,
            _ => Tier::Toast,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery policy bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Blocking modal, dismiss-only
    Urgent,
    /// Transient notice
    Toast,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Urgent => "urgent",
            Tier::Toast => "toast",
        }
    }
}

/// Row an alert refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertPayload {
    Order { order_id: String, status: OrderStatus },
    Message { message_id: String, sender_id: String },
    Restaurant { restaurant_id: String },
    None,
}

impl AlertPayload {
    /// Push tag suffix; alerts about one row collapse on the device.
    pub fn tag(&self) -> String {
        match self {
            AlertPayload::Order { order_id, .. } => format!("order-{order_id}"),
            AlertPayload::Message { message_id, .. } => format!("message-{message_id}"),
            AlertPayload::Restaurant { restaurant_id } => format!("restaurant-{restaurant_id}"),
            AlertPayload::None => "general".to_string(),
        }
    }
}

/// An alert on its way to one recipient. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub id: String,
    pub kind: AlertKind,
    pub tier: Tier,
    /// `None` for generic notices addressed to whoever is viewing
    pub target_role: Option<ActorRole>,
    pub title: String,
    pub message: String,
    pub payload: AlertPayload,
}

impl AlertEvent {
    pub fn new(
        kind: AlertKind,
        target_role: Option<ActorRole>,
        title: impl Into<String>,
        message: impl Into<String>,
        payload: AlertPayload,
    ) -> Self {
        Self {
            id: nanoid::nanoid!(),
            kind,
            tier: kind.tier(),
            target_role,
            title: title.into(),
            message: message.into(),
            payload,
        }
    }
}
