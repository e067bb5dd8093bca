//! Carts service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::error::{DatabaseError, ErrorKind};
use tracing::warn;

use crate::{
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            models::{self, Cart, CartLine, CartOwner, CartUuid, QuantityUpdate},
            quantity,
            repositories::{PgCartLinesRepository, PgCartsRepository},
        },
        products::{models::ProductUuid, repository::PgProductsRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts: PgCartsRepository,
    lines: PgCartLinesRepository,
    products: PgProductsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts: PgCartsRepository::new(),
            lines: PgCartLinesRepository::new(),
            products: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_or_create_cart(&self, owner: CartOwner) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        if let Some(cart) = self.carts.get_cart_by_owner(&mut tx, &owner).await? {
            let lines = self.lines.list_lines(&mut tx, cart.uuid).await?;

            tx.commit().await?;

            return with_lines(cart, lines);
        }

        match self.carts.create_cart(&mut tx, CartUuid::new(), &owner).await {
            Ok(cart) => {
                tx.commit().await?;

                Ok(cart)
            }
            // Lost a first-interaction race on the owner's unique index.
            // The failed insert poisons the transaction, so fetch the
            // winner's cart in a fresh one.
            Err(error) if is_unique_violation(&error) => {
                drop(tx);

                let mut tx = self.db.begin().await?;

                let cart = self
                    .carts
                    .get_cart_by_owner(&mut tx, &owner)
                    .await?
                    .ok_or(CartsServiceError::NotFound)?;
                let lines = self.lines.list_lines(&mut tx, cart.uuid).await?;

                tx.commit().await?;

                with_lines(cart, lines)
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn get_cart(&self, cart: CartUuid) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self.carts.get_cart(&mut tx, cart).await?;
        let lines = self.lines.list_lines(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        with_lines(cart, lines)
    }

    async fn add_item(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        requested: u64,
    ) -> Result<CartLine, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self.carts.get_cart(&mut tx, cart).await?;

        // Row lock: no stock mutation can interleave with the check below.
        let product = self.products.get_product_for_update(&mut tx, product).await?;

        let existing = self
            .lines
            .get_line_quantity(&mut tx, cart.uuid, product.uuid)
            .await?
            .unwrap_or(0);

        let combined = quantity::add_quantity(existing, requested, product.stock)
            .map_err(|available| CartsServiceError::InsufficientStock { available })?;

        let line = self
            .lines
            .upsert_line(&mut tx, cart.uuid, product.uuid, combined)
            .await?;

        tx.commit().await?;

        Ok(line)
    }

    async fn set_quantity(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        requested: i64,
    ) -> Result<QuantityUpdate, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self.carts.get_cart(&mut tx, cart).await?;
        let product = self.products.get_product_for_update(&mut tx, product).await?;

        self.lines
            .get_line_quantity(&mut tx, cart.uuid, product.uuid)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        let clamp = quantity::clamp_to_stock(requested, product.stock);

        if clamp.quantity == 0 {
            self.lines
                .delete_line(&mut tx, cart.uuid, product.uuid)
                .await?;
        } else {
            self.lines
                .upsert_line(&mut tx, cart.uuid, product.uuid, clamp.quantity)
                .await?;
        }

        let lines = self.lines.list_lines(&mut tx, cart.uuid).await?;
        let cart_total = models::cart_total(&lines).ok_or(CartsServiceError::AmountOverflow)?;
        let line_subtotal = product
            .price
            .checked_mul(clamp.quantity)
            .ok_or(CartsServiceError::AmountOverflow)?;

        tx.commit().await?;

        if clamp.clamped {
            warn!(
                cart_uuid = %cart.uuid,
                product_uuid = %product.uuid,
                requested,
                stock = product.stock,
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
        let mut tx = self.db.begin().await?;

        let rows_affected = self.lines.delete_line(&mut tx, cart, product).await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    async fn delete_cart(&self, cart: CartUuid) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.carts.delete_cart(&mut tx, cart).await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

pub(crate) fn with_lines(
    mut cart: Cart,
    lines: Vec<CartLine>,
) -> Result<Cart, CartsServiceError> {
    cart.total = models::cart_total(&lines).ok_or(CartsServiceError::AmountOverflow)?;
    cart.lines = lines;

    Ok(cart)
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error.as_database_error().map(DatabaseError::kind),
        Some(ErrorKind::UniqueViolation)
    )
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Finds the owner's cart, creating an empty one on first interaction.
    /// At most one cart exists per owner.
    async fn get_or_create_cart(&self, owner: CartOwner) -> Result<Cart, CartsServiceError>;

    /// Retrieve a single cart with its lines and computed total.
    async fn get_cart(&self, cart: CartUuid) -> Result<Cart, CartsServiceError>;

    /// Add `requested` units of a product to the cart, accumulating into an
    /// existing line. Requests below 1 count as 1. Fails with
    /// [`CartsServiceError::InsufficientStock`] when the combined quantity
    /// would exceed the product's stock, leaving the cart untouched.
    async fn add_item(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        requested: u64,
    ) -> Result<CartLine, CartsServiceError>;

    /// Set a line's quantity in place. Requests above stock are clamped,
    /// not rejected; requests at or below zero remove the line.
    async fn set_quantity(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        requested: i64,
    ) -> Result<QuantityUpdate, CartsServiceError>;

    /// Remove a line from the cart.
    async fn remove_item(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<(), CartsServiceError>;

    /// Deletes a cart and all of its lines.
    async fn delete_cart(&self, cart: CartUuid) -> Result<(), CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            UserUuid,
            carts::models::{CartOwner, CartUuid, SessionKey},
            products::models::ProductUuid,
        },
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn get_or_create_cart_is_lazy_and_unique_per_owner() -> TestResult {
        let ctx = TestContext::new();
        let owner = CartOwner::User(UserUuid::new());

        let first = ctx.carts.get_or_create_cart(owner.clone()).await?;
        let second = ctx.carts.get_or_create_cart(owner).await?;

        assert_eq!(first.uuid, second.uuid, "one cart per owner");
        assert!(first.lines.is_empty());
        assert_eq!(first.total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_first_interactions_share_one_cart() -> TestResult {
        let ctx = TestContext::new();
        let owner = CartOwner::User(UserUuid::new());

        let (a, b) = tokio::join!(
            ctx.carts.get_or_create_cart(owner.clone()),
            ctx.carts.get_or_create_cart(owner.clone())
        );

        let (a, b) = (a?, b?);

        assert_eq!(a.uuid, b.uuid, "both callers must land on the same cart");

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_first_interactions_share_one_cart_on_postgres() -> TestResult {
        let ctx = TestContext::postgres().await;
        let owner = CartOwner::User(UserUuid::new());

        let (a, b) = tokio::join!(
            ctx.carts.get_or_create_cart(owner.clone()),
            ctx.carts.get_or_create_cart(owner.clone())
        );

        let (a, b) = (a?, b?);

        assert_eq!(a.uuid, b.uuid, "both callers must land on the same cart");

        Ok(())
    }

    #[tokio::test]
    async fn session_and_user_owners_get_distinct_carts() -> TestResult {
        let ctx = TestContext::new();

        let user_cart = ctx
            .carts
            .get_or_create_cart(CartOwner::User(UserUuid::new()))
            .await?;
        let session_cart = ctx
            .carts
            .get_or_create_cart(CartOwner::Session(SessionKey::new("visitor-1")?))
            .await?;

        assert!(user_cart.uuid != session_cart.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_unknown_uuid_returns_not_found() {
        let ctx = TestContext::new();

        let result = ctx.carts.get_cart(CartUuid::new()).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn add_item_creates_line_with_current_price() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        let line = ctx.carts.add_item(cart.uuid, product.uuid, 2).await?;

        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, 15_99);
        assert_eq!(line.subtotal(), Some(31_98));

        Ok(())
    }

    #[tokio::test]
    async fn add_item_accumulates_into_existing_line() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        ctx.carts.add_item(cart.uuid, product.uuid, 2).await?;
        let line = ctx.carts.add_item(cart.uuid, product.uuid, 3).await?;

        assert_eq!(line.quantity, 5, "adds accumulate, no duplicate lines");

        let cart = ctx.carts.get_cart(cart.uuid).await?;
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total, 5 * 15_99);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_zero_quantity_counts_as_one() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        let line = ctx.carts.add_item(cart.uuid, product.uuid, 0).await?;

        assert_eq!(line.quantity, 1);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_beyond_stock_fails_and_leaves_cart_unchanged() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        ctx.carts.add_item(cart.uuid, product.uuid, 20).await?;

        let result = ctx.carts.add_item(cart.uuid, product.uuid, 10).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::InsufficientStock { available: 5 })
            ),
            "expected InsufficientStock with 5 available, got {result:?}"
        );

        let cart = ctx.carts.get_cart(cart.uuid).await?;
        assert_eq!(
            cart.lines.first().map(|l| l.quantity),
            Some(20),
            "failed add must not modify the line"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_does_not_touch_other_lines() -> TestResult {
        let ctx = TestContext::new();
        let shirt = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;
        let wallet = ctx.create_product("Leather Wallet", 29_99, 5).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        ctx.carts.add_item(cart.uuid, wallet.uuid, 2).await?;
        ctx.carts.add_item(cart.uuid, shirt.uuid, 1).await?;

        let cart = ctx.carts.get_cart(cart.uuid).await?;
        let wallet_line = cart
            .lines
            .iter()
            .find(|l| l.product_uuid == wallet.uuid)
            .map(|l| l.quantity);

        assert_eq!(wallet_line, Some(2), "unrelated line must be unaffected");
        assert_eq!(cart.total, 2 * 29_99 + 15_99);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_unknown_product_returns_not_found() -> TestResult {
        let ctx = TestContext::new();
        let cart = ctx.session_cart("visitor-1").await?;

        let result = ctx.carts.add_item(cart.uuid, ProductUuid::new(), 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound for unknown product, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_unknown_cart_returns_not_found() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;

        let result = ctx.carts.add_item(CartUuid::new(), product.uuid, 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound for unknown cart, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_above_stock_clamps_with_warning_flag() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        ctx.carts.add_item(cart.uuid, product.uuid, 25).await?;

        let update = ctx.carts.set_quantity(cart.uuid, product.uuid, 30).await?;

        assert_eq!(update.quantity, 25, "clamped to stock, never higher");
        assert!(update.clamped);
        assert!(!update.removed);
        assert_eq!(update.line_subtotal, 25 * 15_99);
        assert_eq!(update.cart_total, 25 * 15_99);

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_zero_removes_the_line() -> TestResult {
        let ctx = TestContext::new();
        let shirt = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;
        let wallet = ctx.create_product("Leather Wallet", 29_99, 5).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        ctx.carts.add_item(cart.uuid, shirt.uuid, 2).await?;
        ctx.carts.add_item(cart.uuid, wallet.uuid, 1).await?;

        let update = ctx.carts.set_quantity(cart.uuid, shirt.uuid, 0).await?;

        assert!(update.removed);
        assert_eq!(update.line_subtotal, 0);
        assert_eq!(update.cart_total, 29_99, "total excludes the removed line");

        let cart = ctx.carts.get_cart(cart.uuid).await?;
        assert_eq!(cart.lines.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_within_stock_updates_totals() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        ctx.carts.add_item(cart.uuid, product.uuid, 1).await?;

        let update = ctx.carts.set_quantity(cart.uuid, product.uuid, 4).await?;

        assert_eq!(update.quantity, 4);
        assert!(!update.clamped);
        assert_eq!(update.line_subtotal, 4 * 15_99);
        assert_eq!(update.cart_total, 4 * 15_99);

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_on_absent_line_returns_not_found() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        let result = ctx.carts.set_quantity(cart.uuid, product.uuid, 2).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound for absent line, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn totals_beyond_the_amount_range_fail_instead_of_wrapping() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Gold Bar", u64::MAX / 2, 3).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        ctx.carts.add_item(cart.uuid, product.uuid, 3).await?;

        let result = ctx.carts.get_cart(cart.uuid).await;

        assert!(
            matches!(result, Err(CartsServiceError::AmountOverflow)),
            "expected AmountOverflow, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_deletes_the_line() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;
        let cart = ctx.session_cart("visitor-1").await?;

        ctx.carts.add_item(cart.uuid, product.uuid, 2).await?;
        ctx.carts.remove_item(cart.uuid, product.uuid).await?;

        let cart = ctx.carts.get_cart(cart.uuid).await?;
        assert!(cart.lines.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn delete_cart_makes_it_not_found() -> TestResult {
        let ctx = TestContext::new();
        let cart = ctx.session_cart("visitor-1").await?;

        ctx.carts.delete_cart(cart.uuid).await?;

        let result = ctx.carts.get_cart(cart.uuid).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound after deletion, got {result:?}"
        );

        Ok(())
    }
}
