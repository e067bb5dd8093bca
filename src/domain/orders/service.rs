//! Orders service.
//!
//! Order placement is the one genuinely transactional sequence in the
//! storefront: price capture, stock re-check, stock decrement and cart
//! deletion all commit together or not at all.

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        UserUuid,
        carts::{models::CartUuid, repositories::PgCartsRepository},
        orders::{
            errors::OrdersServiceError,
            models::{Order, OrderStatus, OrderUuid},
            repositories::{LockedLine, PgOrderLinesRepository, PgOrdersRepository},
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders: PgOrdersRepository,
    lines: PgOrderLinesRepository,
    carts: PgCartsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            lines: PgOrderLinesRepository::new(),
            carts: PgCartsRepository::new(),
        }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.place_order",
        skip(self),
        fields(
            cart_uuid = %cart,
            order_uuid = tracing::field::Empty,
            line_count = tracing::field::Empty,
            total_paid = tracing::field::Empty
        ),
        err
    )]
    async fn place_order(&self, cart: CartUuid) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self.carts.get_cart(&mut tx, cart).await?;

        // Locks the product rows in uuid order; concurrent placements on
        // the same products serialise here instead of racing the re-check.
        let locked = self.lines.lock_cart_lines(&mut tx, cart.uuid).await?;

        if locked.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        for line in &locked {
            if line.stock < line.quantity {
                // Dropping the transaction rolls back everything staged
                // so far; no order, no lines, no decrements survive.
                return Err(OrdersServiceError::InsufficientStock {
                    product: line.product_uuid,
                    available: line.stock,
                });
            }
        }

        let total_paid = order_total(&locked).ok_or(OrdersServiceError::AmountOverflow)?;

        let span = Span::current();
        span.record("line_count", locked.len());
        span.record("total_paid", total_paid);

        let mut order = self
            .orders
            .create_order(
                &mut tx,
                OrderUuid::new(),
                cart.owner.user_uuid(),
                total_paid,
                OrderStatus::Processing,
            )
            .await?;

        span.record("order_uuid", tracing::field::display(order.uuid));

        for line in &locked {
            self.lines
                .create_order_line(
                    &mut tx,
                    order.uuid,
                    line.product_uuid,
                    line.unit_price,
                    line.quantity,
                )
                .await?;

            self.lines
                .decrement_stock(&mut tx, line.product_uuid, line.quantity)
                .await?;
        }

        self.carts.delete_cart(&mut tx, cart.uuid).await?;

        order.lines = self.lines.list_order_lines(&mut tx, order.uuid).await?;

        tx.commit().await?;

        info!(order_uuid = %order.uuid, total_paid, "placed order");

        Ok(order)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut order = self.orders.get_order(&mut tx, order).await?;
        order.lines = self.lines.list_order_lines(&mut tx, order.uuid).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut orders = self.orders.list_orders(&mut tx, user).await?;

        for order in &mut orders {
            order.lines = self.lines.list_order_lines(&mut tx, order.uuid).await?;
        }

        tx.commit().await?;

        Ok(orders)
    }

    async fn update_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut order = self.orders.update_status(&mut tx, order, status).await?;
        order.lines = self.lines.list_order_lines(&mut tx, order.uuid).await?;

        tx.commit().await?;

        Ok(order)
    }
}

/// Total paid for a set of lines at their captured prices.
///
/// `None` when any subtotal or the running sum overflows `u64`.
pub(crate) fn order_total(lines: &[LockedLine]) -> Option<u64> {
    lines.iter().try_fold(0_u64, |total, line| {
        line.unit_price
            .checked_mul(line.quantity)
            .and_then(|subtotal| total.checked_add(subtotal))
    })
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Materialise an order from the cart's lines at current prices,
    /// decrement each product's stock and delete the cart, atomically.
    ///
    /// Fails with [`OrdersServiceError::EmptyCart`] on a cart with no
    /// lines, and with [`OrdersServiceError::InsufficientStock`] when any
    /// line exceeds the product's stock at placement time; on any failure
    /// no effect of the placement persists.
    async fn place_order(&self, cart: CartUuid) -> Result<Order, OrdersServiceError>;

    /// Retrieve a single order with its lines.
    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Retrieves a user's orders, most recent first.
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, OrdersServiceError>;

    /// Sets the order's status. Transitions are not constrained.
    async fn update_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError>;
}
