//! Order Models

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use jiff::Timestamp;
use serde::Serialize;
use thiserror::Error;

use crate::{
    domain::{UserUuid, products::models::ProductUuid},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Fulfilment status of an order.
///
/// A flat enum: any value may be set at creation and transitions are not
/// constrained here. Placement creates orders as [`OrderStatus::Processing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

/// Unrecognised order status value.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(String);

impl OrderStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

/// Order Model
///
/// `total_paid` is captured at placement time and never recomputed from
/// live product prices. `user_uuid` is absent for anonymous orders and
/// nulled if the user is later deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub uuid: OrderUuid,
    pub user_uuid: Option<UserUuid>,
    pub total_paid: u64,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub created_at: Timestamp,
}

/// Order Line Model
///
/// `unit_price` is the price captured when the order was placed; the
/// product reference is nulled if the product is later deleted, the
/// captured price survives.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub product_uuid: Option<ProductUuid>,
    pub unit_price: u64,
    pub quantity: u64,
}

impl OrderLine {
    /// Line subtotal at the captured price.
    ///
    /// `None` when the product of price and quantity exceeds `u64`.
    #[must_use]
    pub fn subtotal(&self) -> Option<u64> {
        self.unit_price.checked_mul(self.quantity)
    }
}
