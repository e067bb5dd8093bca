//! In-memory orders service.

use async_trait::async_trait;
use jiff::Timestamp;
use tracing::info;

use crate::{
    domain::{
        UserUuid,
        carts::models::CartUuid,
        orders::{
            OrdersService, OrdersServiceError,
            models::{Order, OrderLine, OrderStatus, OrderUuid},
        },
    },
    memory::store::MemoryStore,
};

#[derive(Debug, Clone)]
pub struct MemoryOrdersService {
    store: MemoryStore,
}

impl MemoryOrdersService {
    #[must_use]
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OrdersService for MemoryOrdersService {
    async fn place_order(&self, cart: CartUuid) -> Result<Order, OrdersServiceError> {
        // The writer lock is the placement's critical section: concurrent
        // placements serialise here, so the stock checks below cannot race
        // another placement's decrements.
        let mut tables = self.store.write().await;

        let stored = tables
            .carts
            .get(&cart)
            .cloned()
            .ok_or(OrdersServiceError::NotFound)?;

        if stored.lines.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        // Validate every line before mutating anything; bailing out here
        // leaves the tables exactly as they were.
        let mut lines = Vec::with_capacity(stored.lines.len());

        for (product_uuid, quantity) in &stored.lines {
            let product = tables
                .products
                .get(product_uuid)
                .ok_or(OrdersServiceError::NotFound)?;

            if product.stock < *quantity {
                return Err(OrdersServiceError::InsufficientStock {
                    product: *product_uuid,
                    available: product.stock,
                });
            }

            lines.push(OrderLine {
                product_uuid: Some(*product_uuid),
                unit_price: product.price,
                quantity: *quantity,
            });
        }

        let total_paid = lines
            .iter()
            .try_fold(0_u64, |total, line| {
                line.subtotal()
                    .and_then(|subtotal| total.checked_add(subtotal))
            })
            .ok_or(OrdersServiceError::AmountOverflow)?;

        let order = Order {
            uuid: OrderUuid::new(),
            user_uuid: stored.owner.user_uuid(),
            total_paid,
            status: OrderStatus::Processing,
            lines,
            created_at: Timestamp::now(),
        };

        for line in &order.lines {
            if let Some(product_uuid) = line.product_uuid {
                if let Some(product) = tables.products.get_mut(&product_uuid) {
                    product.stock -= line.quantity;
                    product.updated_at = order.created_at;
                }
            }
        }

        tables.carts.remove(&cart);
        tables.orders.insert(order.uuid, order.clone());

        info!(order_uuid = %order.uuid, total_paid, "placed order");

        Ok(order)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let tables = self.store.read().await;

        tables
            .orders
            .get(&order)
            .cloned()
            .ok_or(OrdersServiceError::NotFound)
    }

    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, OrdersServiceError> {
        let tables = self.store.read().await;

        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| order.user_uuid == Some(user))
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.uuid.cmp(&b.uuid)));

        Ok(orders)
    }

    async fn update_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let mut tables = self.store.write().await;

        let record = tables
            .orders
            .get_mut(&order)
            .ok_or(OrdersServiceError::NotFound)?;

        record.status = status;

        Ok(record.clone())
    }
}
