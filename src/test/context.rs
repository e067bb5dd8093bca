//! Test context for service-level tests.
//!
//! [`TestContext::new`] runs every service against the in-memory backend,
//! so most of the suite needs no external database; the backends share
//! their business rules through [`crate::domain::carts::quantity`] and the
//! service contracts. [`TestContext::postgres`] backs the same interface
//! with an isolated containerised database for tests that verify the SQL
//! layer itself.

use std::sync::Arc;

use crate::{
    context::AppContext,
    database::Db,
    domain::{
        carts::{
            CartsService, CartsServiceError, PgCartsService,
            models::{Cart, CartOwner, SessionKey},
        },
        orders::{OrdersService, PgOrdersService},
        products::{
            PgProductsService, ProductsService, ProductsServiceError,
            models::{NewProduct, Product, ProductUuid},
        },
    },
    test::db::TestDb,
};

pub(crate) struct TestContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
}

impl TestContext {
    pub(crate) fn new() -> Self {
        let ctx = AppContext::in_memory();

        Self {
            products: ctx.products,
            carts: ctx.carts,
            orders: ctx.orders,
        }
    }

    /// Services over an isolated PostgreSQL database, exercising the real
    /// SQL, row decoders and locking behaviour.
    pub(crate) async fn postgres() -> Self {
        let db = TestDb::new().await;
        let handle = Db::new(db.pool.clone());

        Self {
            products: Arc::new(PgProductsService::new(handle.clone())),
            carts: Arc::new(PgCartsService::new(handle.clone())),
            orders: Arc::new(PgOrdersService::new(handle)),
        }
    }

    /// Create a product with the given price (minor units) and stock.
    pub(crate) async fn create_product(
        &self,
        name: &str,
        price: u64,
        stock: u64,
    ) -> Result<Product, ProductsServiceError> {
        self.products
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                name: name.to_string(),
                description: None,
                price,
                stock,
                category_uuid: None,
            })
            .await
    }

    /// Create (or fetch) the anonymous cart for the given session key.
    pub(crate) async fn session_cart(&self, key: &str) -> Result<Cart, CartsServiceError> {
        let key = SessionKey::new(key)?;

        self.carts.get_or_create_cart(CartOwner::Session(key)).await
    }
}
