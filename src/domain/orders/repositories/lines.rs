//! Order Lines Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::{
    carts::models::CartUuid,
    orders::models::{OrderLine, OrderUuid},
    products::{
        models::ProductUuid,
        repository::{try_get_amount, try_into_amount},
    },
};

const LOCK_CART_LINES_SQL: &str = include_str!("../sql/lock_cart_lines.sql");
const CREATE_ORDER_LINE_SQL: &str = include_str!("../sql/create_order_line.sql");
const LIST_ORDER_LINES_SQL: &str = include_str!("../sql/list_order_lines.sql");
const DECREMENT_STOCK_SQL: &str = include_str!("../sql/decrement_stock.sql");

/// A cart line joined with its product's live price and stock, with the
/// product row locked for the rest of the transaction.
#[derive(Debug, Clone)]
pub(crate) struct LockedLine {
    pub product_uuid: ProductUuid,
    pub unit_price: u64,
    pub stock: u64,
    pub quantity: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderLinesRepository;

impl PgOrderLinesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Fetch the cart's lines and lock the referenced product rows,
    /// in ascending product uuid order to keep lock acquisition
    /// deadlock-free across concurrent placements.
    pub(crate) async fn lock_cart_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Vec<LockedLine>, sqlx::Error> {
        query_as::<Postgres, LockedLine>(LOCK_CART_LINES_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_order_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        product: ProductUuid,
        unit_price: u64,
        quantity: u64,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_ORDER_LINE_SQL)
            .bind(Uuid::now_v7())
            .bind(order.into_uuid())
            .bind(product.into_uuid())
            .bind(try_into_amount(unit_price, "unit_price")?)
            .bind(try_into_amount(quantity, "quantity")?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn list_order_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderLine>, sqlx::Error> {
        query_as::<Postgres, OrderLine>(LIST_ORDER_LINES_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn decrement_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<(), sqlx::Error> {
        query(DECREMENT_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(try_into_amount(quantity, "quantity")?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for LockedLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            unit_price: try_get_amount(row, "unit_price")?,
            stock: try_get_amount(row, "stock")?,
            quantity: try_get_amount(row, "quantity")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product_uuid: row
                .try_get::<Option<Uuid>, _>("product_uuid")?
                .map(ProductUuid::from_uuid),
            unit_price: try_get_amount(row, "unit_price")?,
            quantity: try_get_amount(row, "quantity")?,
        })
    }
}
