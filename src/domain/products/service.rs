//! Products service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::products::{
        errors::ProductsServiceError,
        models::{Category, NewCategory, NewProduct, Product, ProductUpdate, ProductUuid},
        repository::PgProductsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgProductsService {
    db: Db,
    repository: PgProductsRepository,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    async fn list_products(&self) -> Result<Vec<Product>, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let products = self.repository.list_products(&mut tx).await?;

        tx.commit().await?;

        Ok(products)
    }

    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let product = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(product)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let updated = self
            .repository
            .update_product(&mut tx, product, update)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn set_stock(
        &self,
        product: ProductUuid,
        stock: u64,
    ) -> Result<Product, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let updated = self.repository.set_stock(&mut tx, product, stock).await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.delete_product(&mut tx, product).await?;

        if rows_affected == 0 {
            return Err(ProductsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let categories = self.repository.list_categories(&mut tx).await?;

        tx.commit().await?;

        Ok(categories)
    }

    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<Category, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_category(&mut tx, category).await?;

        tx.commit().await?;

        Ok(created)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieves all products.
    async fn list_products(&self) -> Result<Vec<Product>, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError>;

    /// Creates a new product.
    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError>;

    /// Updates name, description, price or category of a product.
    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError>;

    /// Administrative restock: replaces the stock count outright.
    async fn set_stock(
        &self,
        product: ProductUuid,
        stock: u64,
    ) -> Result<Product, ProductsServiceError>;

    /// Deletes a product. Cart lines referencing it are removed; order
    /// lines keep their captured price but lose the product reference.
    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError>;

    /// Retrieves all categories.
    async fn list_categories(&self) -> Result<Vec<Category>, ProductsServiceError>;

    /// Creates a new category.
    async fn create_category(&self, category: NewCategory)
    -> Result<Category, ProductsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::products::models::{NewCategory, NewProduct, ProductUpdate, ProductUuid},
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn create_product_returns_created_fields() -> TestResult {
        let ctx = TestContext::new();
        let uuid = ProductUuid::new();

        let product = ctx
            .products
            .create_product(NewProduct {
                uuid,
                name: "Classic T-Shirt".to_string(),
                description: Some("A comfortable 100% cotton t-shirt.".to_string()),
                price: 15_99,
                stock: 25,
                category_uuid: None,
            })
            .await?;

        assert_eq!(product.uuid, uuid);
        assert_eq!(product.price, 15_99);
        assert_eq!(product.stock, 25);

        Ok(())
    }

    #[tokio::test]
    async fn create_product_duplicate_uuid_returns_already_exists() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Leather Wallet", 29_99, 5).await?;

        let result = ctx
            .products
            .create_product(NewProduct {
                uuid: product.uuid,
                name: "Leather Wallet".to_string(),
                description: None,
                price: 29_99,
                stock: 5,
                category_uuid: None,
            })
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn get_product_unknown_uuid_returns_not_found() {
        let ctx = TestContext::new();

        let result = ctx.products.get_product(ProductUuid::new()).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn list_products_returns_all_created() -> TestResult {
        let ctx = TestContext::new();

        ctx.create_product("Running Shoes", 79_99, 10).await?;
        ctx.create_product("Classic T-Shirt", 15_99, 25).await?;

        let products = ctx.products.list_products().await?;

        assert_eq!(products.len(), 2, "expected both products listed");

        Ok(())
    }

    #[tokio::test]
    async fn update_product_changes_only_given_fields() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;

        let updated = ctx
            .products
            .update_product(
                product.uuid,
                ProductUpdate {
                    price: Some(17_49),
                    ..ProductUpdate::default()
                },
            )
            .await?;

        assert_eq!(updated.price, 17_49);
        assert_eq!(updated.name, "Classic T-Shirt");
        assert_eq!(updated.stock, 25);

        Ok(())
    }

    #[tokio::test]
    async fn set_stock_replaces_count() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;

        let updated = ctx.products.set_stock(product.uuid, 3).await?;

        assert_eq!(updated.stock, 3);

        Ok(())
    }

    #[tokio::test]
    async fn delete_product_makes_it_not_found() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product("Classic T-Shirt", 15_99, 25).await?;

        ctx.products.delete_product(product.uuid).await?;

        let result = ctx.products.get_product(product.uuid).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound)),
            "expected NotFound after deletion, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_product_unknown_uuid_returns_not_found() {
        let ctx = TestContext::new();

        let result = ctx.products.delete_product(ProductUuid::new()).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn categories_round_trip() -> TestResult {
        let ctx = TestContext::new();

        let category = ctx
            .products
            .create_category(NewCategory {
                uuid: crate::domain::products::models::CategoryUuid::new(),
                name: "Clothing".to_string(),
                slug: "clothing".to_string(),
            })
            .await?;

        let categories = ctx.products.list_categories().await?;

        assert_eq!(categories.len(), 1, "expected one category");
        assert_eq!(
            categories.first().map(|c| c.uuid),
            Some(category.uuid),
            "expected the created category"
        );

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_category_slug_returns_already_exists() -> TestResult {
        let ctx = TestContext::new();

        for expected_err in [false, true] {
            let result = ctx
                .products
                .create_category(NewCategory {
                    uuid: crate::domain::products::models::CategoryUuid::new(),
                    name: "Clothing".to_string(),
                    slug: "clothing".to_string(),
                })
                .await;

            if expected_err {
                assert!(
                    matches!(result, Err(ProductsServiceError::AlreadyExists)),
                    "expected AlreadyExists, got {result:?}"
                );
            } else {
                result?;
            }
        }

        Ok(())
    }
}
