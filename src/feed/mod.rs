//! Change feed
//!
//! Row-level change events emitted by the backend for the `orders`,
//! `messages` and `restaurants` tables. The backend itself is an external
//! collaborator reached through [`ChangeFeed`]; [`LocalChangeFeed`] is the
//! in-process implementation.

mod local_feed;
mod topic;
pub use local_feed::*;
pub use topic::*;


use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;
use tracing::trace;

use crate::constants::MESSAGES_TABLE;
use crate::constants::ORDERS_TABLE;
use crate::constants::RESTAURANTS_TABLE;
use crate::ActorId;
use crate::FeedError;
use crate::Order;
use crate::OrderStatus;
use crate::RestaurantId;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Orders,
    Messages,
    Restaurants,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Orders => ORDERS_TABLE,
            Table::Messages => MESSAGES_TABLE,
            Table::Restaurants => RESTAURANTS_TABLE,
        }
    }

    pub fn parse(name: &str) -> Option<Table> {
        match name {
            ORDERS_TABLE => Some(Table::Orders),
            MESSAGES_TABLE => Some(Table::Messages),
            RESTAURANTS_TABLE => Some(Table::Restaurants),
            _ => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Insert,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: String,
    pub sender_id: ActorId,
    pub receiver_id: ActorId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantRow {
    pub id: RestaurantId,
    pub owner_id: ActorId,
    pub name: String,
    #[serde(default)]
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Order(Order),
    Message(MessageRow),
    Restaurant(RestaurantRow),
}

impl Row {
    pub fn table(&self) -> Table {
        match self {
            Row::Order(_) => Table::Orders,
            Row::Message(_) => Table::Messages,
            Row::Restaurant(_) => Table::Restaurants,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Row::Order(o) => &o.id,
            Row::Message(m) => &m.id,
            Row::Restaurant(r) => &r.id,
        }
    }

    /// Column value as text, for topic filters.
    pub fn column(
        &self,
        name: &str,
    ) -> Option<String> {
        match (self, name) {
            (_, "id") => Some(self.id().to_string()),
            (Row::Order(o), "status") => Some(o.status.to_string()),
            (Row::Order(o), "customer_id") => Some(o.customer_id.clone()),
            (Row::Order(o), "restaurant_id") => Some(o.restaurant_id.clone()),
            (Row::Order(o), "driver_id") => o.driver_id.clone(),
            (Row::Message(m), "sender_id") => Some(m.sender_id.clone()),
            (Row::Message(m), "receiver_id") => Some(m.receiver_id.clone()),
            (Row::Restaurant(r), "owner_id") => Some(r.owner_id.clone()),
            _ => None,
        }
    }

    fn decode(
        table: Table,
        value: serde_json::Value,
    ) -> Result<Row> {
        let row = match table {
            Table::Orders => Row::Order(serde_json::from_value(value)?),
            Table::Messages => Row::Message(serde_json::from_value(value)?),
            Table::Restaurants => Row::Restaurant(serde_json::from_value(value)?),
        };
        Ok(row)
    }

    fn encode(&self) -> Result<serde_json::Value> {
        let value = match self {
            Row::Order(o) => serde_json::to_value(o)?,
            Row::Message(m) => serde_json::to_value(m)?,
            Row::Restaurant(r) => serde_json::to_value(r)?,
        };
        Ok(value)
    }
}

/// One row-level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: EventKind,
    pub filter: Option<String>,
    pub old: Option<Row>,
    pub new: Row,
}

#[derive(Deserialize, Serialize)]
struct WireChangeEvent {
    table: String,
    event: EventKind,
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    old: Option<serde_json::Value>,
    new: serde_json::Value,
}

impl ChangeEvent {
    pub fn insert(new: Row) -> Self {
        Self {
            table: new.table(),
            kind: EventKind::Insert,
            filter: None,
            old: None,
            new,
        }
    }

    pub fn update(
        old: Option<Row>,
        new: Row,
    ) -> Self {
        Self {
            table: new.table(),
            kind: EventKind::Update,
            filter: None,
            old,
            new,
        }
    }

    /// Decodes the backend wire format
    /// `{table, event, filter, old, new}`.
    ///
    /// Backends commonly ship only the primary key in `old`; an `old` that
    /// does not decode into a full row is treated as absent.
    pub fn from_json(payload: &str) -> Result<Self> {
        let wire: WireChangeEvent = serde_json::from_str(payload)?;
        let table =
            Table::parse(&wire.table).ok_or_else(|| FeedError::UnknownTable(wire.table.clone()))?;

        let new = Row::decode(table, wire.new)?;
        let old = match wire.old {
            Some(value) if !value.is_null() => match Row::decode(table, value) {
                Ok(row) => Some(row),
                Err(e) => {
                    trace!(%table, "partial old row ignored: {:?}", e);
                    None
                }
            },
            _ => None,
        };

        Ok(Self {
            table,
            kind: wire.event,
            filter: wire.filter,
            old,
            new,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let wire = WireChangeEvent {
            table: self.table.as_str().to_string(),
            event: self.kind,
            filter: self.filter.clone(),
            old: self.old.as_ref().map(Row::encode).transpose()?,
            new: self.new.encode()?,
        };
        Ok(serde_json::to_string(&wire)?)
    }

    pub fn row_id(&self) -> &str {
        self.new.id()
    }

    pub fn new_order(&self) -> Option<&Order> {
        match &self.new {
            Row::Order(o) => Some(o),
            _ => None,
        }
    }

    /// Order status after the change
    pub fn new_status(&self) -> Option<OrderStatus> {
        self.new_order().map(|o| o.status)
    }

    /// Whether the status column moved. Without a usable `old` row an update
    /// is assumed to have changed it.
    pub fn status_changed(&self) -> bool {
        match (self.kind, &self.old, &self.new) {
            (EventKind::Insert, _, _) => true,
            (EventKind::Update, Some(Row::Order(old)), Row::Order(new)) => old.status != new.status,
            (EventKind::Update, None, Row::Order(_)) => true,
            _ => false,
        }
    }
}

pub type FeedStream = Pin<Box<dyn Stream<Item = ChangeEvent> + Send>>;

/// Backend change feed. A returned stream that ends means the backend
/// channel dropped.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChangeFeed: Send + Sync + 'static {
    async fn connect(
        &self,
        topic: &Topic,
    ) -> Result<FeedStream>;
}
