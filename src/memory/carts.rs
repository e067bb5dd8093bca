//! In-memory carts service.

use async_trait::async_trait;
use jiff::Timestamp;
use tracing::warn;

use crate::{
    domain::{
        carts::{
            CartsService, CartsServiceError,
            models::{Cart, CartLine, CartOwner, CartUuid, QuantityUpdate},
            quantity,
        },
        products::models::ProductUuid,
    },
    memory::store::{MemoryStore, StoredCart},
};

#[derive(Debug, Clone)]
pub struct MemoryCartsService {
    store: MemoryStore,
}

impl MemoryCartsService {
    #[must_use]
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CartsService for MemoryCartsService {
    async fn get_or_create_cart(&self, owner: CartOwner) -> Result<Cart, CartsServiceError> {
        let mut tables = self.store.write().await;

        if let Some(existing) = tables.carts.values().find(|cart| cart.owner == owner) {
            let existing = existing.clone();
            return tables
                .cart_view(&existing)
                .ok_or(CartsServiceError::AmountOverflow);
        }

        let stored = StoredCart::new(owner);
        let view = tables
            .cart_view(&stored)
            .ok_or(CartsServiceError::AmountOverflow)?;
        tables.carts.insert(stored.uuid, stored);

        Ok(view)
    }

    async fn get_cart(&self, cart: CartUuid) -> Result<Cart, CartsServiceError> {
        let tables = self.store.read().await;

        let stored = tables.carts.get(&cart).ok_or(CartsServiceError::NotFound)?;

        tables
            .cart_view(stored)
            .ok_or(CartsServiceError::AmountOverflow)
    }

    async fn add_item(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        requested: u64,
    ) -> Result<CartLine, CartsServiceError> {
        let mut tables = self.store.write().await;

        let (name, price, stock) = {
            let product = tables
                .products
                .get(&product)
                .ok_or(CartsServiceError::NotFound)?;
            (product.name.clone(), product.price, product.stock)
        };

        let stored = tables
            .carts
            .get_mut(&cart)
            .ok_or(CartsServiceError::NotFound)?;

        let existing = stored.lines.get(&product).copied().unwrap_or(0);

        let combined = quantity::add_quantity(existing, requested, stock)
            .map_err(|available| CartsServiceError::InsufficientStock { available })?;

        stored.lines.insert(product, combined);
        stored.updated_at = Timestamp::now();

        Ok(CartLine {
            product_uuid: product,
            product_name: name,
            quantity: combined,
            unit_price: price,
        })
    }

    async fn set_quantity(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        requested: i64,
    ) -> Result<QuantityUpdate, CartsServiceError> {
        let mut tables = self.store.write().await;

        let (price, stock) = {
            let product = tables
                .products
                .get(&product)
                .ok_or(CartsServiceError::NotFound)?;
            (product.price, product.stock)
        };

        let stored = tables
            .carts
            .get_mut(&cart)
            .ok_or(CartsServiceError::NotFound)?;

        if !stored.lines.contains_key(&product) {
            return Err(CartsServiceError::NotFound);
        }

        let clamp = quantity::clamp_to_stock(requested, stock);

        if clamp.quantity == 0 {
            stored.lines.remove(&product);
        } else {
            stored.lines.insert(product, clamp.quantity);
        }
        stored.updated_at = Timestamp::now();

        let stored = stored.clone();
        let cart_total = tables
            .cart_view(&stored)
            .ok_or(CartsServiceError::AmountOverflow)?
            .total;
        let line_subtotal = price
            .checked_mul(clamp.quantity)
            .ok_or(CartsServiceError::AmountOverflow)?;

        if clamp.clamped {
            warn!(
                cart_uuid = %cart,
                product_uuid = %product,
                requested,
                stock,
                "requested quantity clamped to available stock"
            );
        }

        Ok(QuantityUpdate {
            quantity: clamp.quantity,
            clamped: clamp.clamped,
            removed: clamp.quantity == 0,
            line_subtotal,
            cart_total,
        })
    }

    async fn remove_item(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tables = self.store.write().await;

        let stored = tables
            .carts
            .get_mut(&cart)
            .ok_or(CartsServiceError::NotFound)?;

        if stored.lines.remove(&product).is_none() {
            return Err(CartsServiceError::NotFound);
        }
        stored.updated_at = Timestamp::now();

        Ok(())
    }

    async fn delete_cart(&self, cart: CartUuid) -> Result<(), CartsServiceError> {
        let mut tables = self.store.write().await;

        if tables.carts.remove(&cart).is_none() {
            return Err(CartsServiceError::NotFound);
        }

        Ok(())
    }
}

