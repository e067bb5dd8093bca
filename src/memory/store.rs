//! Shared in-memory table set.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use jiff::Timestamp;
use tokio::sync::RwLock;

use crate::domain::{
    carts::models::{self, Cart, CartLine, CartOwner, CartUuid},
    orders::models::{Order, OrderUuid},
    products::models::{Category, CategoryUuid, Product, ProductUuid},
};

/// Process-local stand-in for the persistent record store.
///
/// Cloning is cheap and shares the underlying tables, mirroring how the
/// Postgres services share one pool.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, Tables> {
        self.state.read().await
    }

    /// Exclusive access to every table at once. The write guard is the
    /// memory backend's transaction: mutations made while holding it are
    /// observed by no one until the guard is released, and a placement
    /// that bails out before mutating leaves the tables untouched.
    pub(crate) async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, Tables> {
        self.state.write().await
    }
}

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub products: HashMap<ProductUuid, Product>,
    pub categories: HashMap<CategoryUuid, Category>,
    pub carts: HashMap<CartUuid, StoredCart>,
    pub orders: HashMap<OrderUuid, Order>,
}

/// A cart as stored: lines are a quantity per product, keeping the
/// one-line-per-product invariant structural.
#[derive(Debug, Clone)]
pub(crate) struct StoredCart {
    pub uuid: CartUuid,
    pub owner: CartOwner,
    pub lines: BTreeMap<ProductUuid, u64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StoredCart {
    pub(crate) fn new(owner: CartOwner) -> Self {
        let now = Timestamp::now();

        Self {
            uuid: CartUuid::new(),
            owner,
            lines: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Tables {
    /// Materialise a cart view with lines priced off the live catalog.
    ///
    /// Products are never deleted while a cart line references them (the
    /// products service drops such lines first), so a missing product here
    /// is skipped rather than treated as an error. `None` when the cart
    /// total overflows the amount range.
    pub(crate) fn cart_view(&self, stored: &StoredCart) -> Option<Cart> {
        let lines: Vec<CartLine> = stored
            .lines
            .iter()
            .filter_map(|(product_uuid, quantity)| {
                self.products.get(product_uuid).map(|product| CartLine {
                    product_uuid: *product_uuid,
                    product_name: product.name.clone(),
                    quantity: *quantity,
                    unit_price: product.price,
                })
            })
            .collect();

        let total = models::cart_total(&lines)?;

        Some(Cart {
            uuid: stored.uuid,
            owner: stored.owner.clone(),
            lines,
            total,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}
