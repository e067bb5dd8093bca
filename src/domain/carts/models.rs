//! Cart Models

use jiff::Timestamp;
use serde::Serialize;
use thiserror::Error;

use crate::{
    domain::{UserUuid, products::models::ProductUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Session key for anonymous carts.
///
/// The caller owns the visitor-to-key mapping (a cookie, typically); this
/// crate only uses the key to locate the visitor's single cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionKey(String);

/// Rejected session key values.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("session key must not be empty")]
pub struct InvalidSessionKey;

impl SessionKey {
    /// Wraps a raw session identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSessionKey`] when the key is empty or blank.
    pub fn new(key: impl Into<String>) -> Result<Self, InvalidSessionKey> {
        let key = key.into();

        if key.trim().is_empty() {
            return Err(InvalidSessionKey);
        }

        Ok(Self(key))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity a cart belongs to: a known user or an anonymous session.
/// Exactly one of the two, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CartOwner {
    User(UserUuid),
    Session(SessionKey),
}

impl CartOwner {
    /// The user reference an order placed from this cart should carry.
    #[must_use]
    pub fn user_uuid(&self) -> Option<UserUuid> {
        match self {
            Self::User(user) => Some(*user),
            Self::Session(_) => None,
        }
    }
}

/// Cart Model
///
/// `total` is computed from live product prices at read time, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub uuid: CartUuid,
    pub owner: CartOwner,
    pub lines: Vec<CartLine>,
    pub total: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Cart Line Model
///
/// At most one line per (cart, product); adds accumulate into `quantity`.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_uuid: ProductUuid,
    pub product_name: String,
    pub quantity: u64,
    pub unit_price: u64,
}

impl CartLine {
    /// Line subtotal at current prices.
    ///
    /// `None` when the product of price and quantity exceeds `u64`.
    #[must_use]
    pub fn subtotal(&self) -> Option<u64> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// Total of a set of lines at current prices.
///
/// `None` when any subtotal or the running sum overflows `u64`.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Option<u64> {
    lines.iter().try_fold(0_u64, |total, line| {
        line.subtotal()
            .and_then(|subtotal| total.checked_add(subtotal))
    })
}

/// Result of an in-place quantity update, for client display.
#[derive(Debug, Clone, Serialize)]
pub struct QuantityUpdate {
    /// The quantity the line ended up with.
    pub quantity: u64,
    /// Set when the request was reduced to the available stock.
    pub clamped: bool,
    /// Set when the line was removed outright.
    pub removed: bool,
    /// Subtotal of the affected line after the update.
    pub line_subtotal: u64,
    /// Total of the whole cart after the update.
    pub cart_total: u64,
}
