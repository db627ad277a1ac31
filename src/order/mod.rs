//! Order model and lifecycle.
//!
//! An order walks a strict chain of statuses:
//!
//! ```text
//! pending -> accepted -> preparing -> pickup_pending -> pickup_accepted
//!         -> picked_up -> delivering -> delivered
//! ```
//!
//! `cancelled` is reachable from every non-terminal status. The edge
//! `pickup_pending -> pickup_accepted` is the claim: it binds the driver and is
//! the only transition that needs an at-most-once guarantee.

mod state_machine;
mod transitions;
pub use state_machine::*;
pub(crate) use transitions::*;


use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

pub type OrderId = String;
pub type ActorId = String;
pub type RestaurantId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    PickupPending,
    PickupAccepted,
    PickedUp,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::PickupPending => "pickup_pending",
            OrderStatus::PickupAccepted => "pickup_accepted",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Customer-facing wording used in status-changed alerts
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "waiting for the restaurant",
            OrderStatus::Accepted => "accepted by the restaurant",
            OrderStatus::Preparing => "being prepared",
            OrderStatus::PickupPending => "ready for pickup",
            OrderStatus::PickupAccepted => "assigned to a driver",
            OrderStatus::PickedUp => "picked up",
            OrderStatus::Delivering => "on the way",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The single forward edge out of this status, if any.
    pub fn successor(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Accepted),
            OrderStatus::Accepted => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::PickupPending),
            OrderStatus::PickupPending => Some(OrderStatus::PickupAccepted),
            OrderStatus::PickupAccepted => Some(OrderStatus::PickedUp),
            OrderStatus::PickedUp => Some(OrderStatus::Delivering),
            OrderStatus::Delivering => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    /// Statuses in which `driver_id` must be set.
    pub fn requires_driver(&self) -> bool {
        matches!(
            self,
            OrderStatus::PickupAccepted
                | OrderStatus::PickedUp
                | OrderStatus::Delivering
                | OrderStatus::Delivered
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "preparing" => Ok(OrderStatus::Preparing),
            "pickup_pending" => Ok(OrderStatus::PickupPending),
            "pickup_accepted" => Ok(OrderStatus::PickupAccepted),
            "picked_up" => Ok(OrderStatus::PickedUp),
            "delivering" => Ok(OrderStatus::Delivering),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub customer_id: ActorId,
    pub restaurant_id: RestaurantId,
    #[serde(default)]
    pub driver_id: Option<ActorId>,
    /// Total in minor currency units
    #[serde(default)]
    pub total_cents: u64,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

impl Order {
    /// A freshly checked-out order in `pending`.
    pub fn new(
        id: impl Into<OrderId>,
        customer_id: impl Into<ActorId>,
        restaurant_id: impl Into<RestaurantId>,
        total_cents: u64,
        delivery_address: impl Into<String>,
    ) -> Self {
        let now = crate::time::now_millis();
        Self {
            id: id.into(),
            status: OrderStatus::Pending,
            customer_id: customer_id.into(),
            restaurant_id: restaurant_id.into(),
            driver_id: None,
            total_cents,
            delivery_address: delivery_address.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// `driver_id` is set iff the status requires a driver.
    pub fn driver_invariant_holds(&self) -> bool {
        self.driver_id.is_some() == self.status.requires_driver()
    }

    /// Open for claiming by any driver.
    pub fn is_available_for_pickup(&self) -> bool {
        self.status == OrderStatus::PickupPending && self.driver_id.is_none()
    }

    /// First eight characters, as shown to people
    pub fn short_id(&self) -> &str {
        let end = self.id.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.id.len());
        &self.id[..end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    RestaurantOwner,
    DeliveryDriver,
    Admin,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Customer => "customer",
            ActorRole::RestaurantOwner => "restaurant_owner",
            ActorRole::DeliveryDriver => "delivery_driver",
            ActorRole::Admin => "admin",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Someone acting on orders and viewing alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: ActorRole,
    /// Owned restaurant, for restaurant owners
    #[serde(default)]
    pub restaurant_id: Option<RestaurantId>,
}

impl Actor {
    pub fn customer(id: impl Into<ActorId>) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::Customer,
            restaurant_id: None,
        }
    }

    pub fn restaurant_owner(
        id: impl Into<ActorId>,
        restaurant_id: impl Into<RestaurantId>,
    ) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::RestaurantOwner,
            restaurant_id: Some(restaurant_id.into()),
        }
    }

    pub fn driver(id: impl Into<ActorId>) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::DeliveryDriver,
            restaurant_id: None,
        }
    }

    pub fn admin(id: impl Into<ActorId>) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::Admin,
            restaurant_id: None,
        }
    }

    pub fn owns_restaurant(
        &self,
        restaurant_id: &str,
    ) -> bool {
        self.role == ActorRole::RestaurantOwner
            && self.restaurant_id.as_deref() == Some(restaurant_id)
    }
}
