//! In-memory products service.

use async_trait::async_trait;
use jiff::Timestamp;

use crate::{
    domain::products::{
        ProductsService, ProductsServiceError,
        models::{Category, NewCategory, NewProduct, Product, ProductUpdate, ProductUuid},
    },
    memory::store::MemoryStore,
};

#[derive(Debug, Clone)]
pub struct MemoryProductsService {
    store: MemoryStore,
}

impl MemoryProductsService {
    #[must_use]
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProductsService for MemoryProductsService {
    async fn list_products(&self) -> Result<Vec<Product>, ProductsServiceError> {
        let tables = self.store.read().await;

        let mut products: Vec<Product> = tables.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.uuid.cmp(&b.uuid)));

        Ok(products)
    }

    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError> {
        let tables = self.store.read().await;

        tables
            .products
            .get(&product)
            .cloned()
            .ok_or(ProductsServiceError::NotFound)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError> {
        let mut tables = self.store.write().await;

        if tables.products.contains_key(&product.uuid) {
            return Err(ProductsServiceError::AlreadyExists);
        }

        if let Some(category) = product.category_uuid {
            if !tables.categories.contains_key(&category) {
                return Err(ProductsServiceError::InvalidReference);
            }
        }

        let now = Timestamp::now();
        let created = Product {
            uuid: product.uuid,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            category_uuid: product.category_uuid,
            created_at: now,
            updated_at: now,
        };

        tables.products.insert(created.uuid, created.clone());

        Ok(created)
    }

    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError> {
        let mut tables = self.store.write().await;

        if let Some(category) = update.category_uuid {
            if !tables.categories.contains_key(&category) {
                return Err(ProductsServiceError::InvalidReference);
            }
        }

        let record = tables
            .products
            .get_mut(&product)
            .ok_or(ProductsServiceError::NotFound)?;

        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(description) = update.description {
            record.description = Some(description);
        }
        if let Some(price) = update.price {
            record.price = price;
        }
        if let Some(category) = update.category_uuid {
            record.category_uuid = Some(category);
        }
        record.updated_at = Timestamp::now();

        Ok(record.clone())
    }

    async fn set_stock(
        &self,
        product: ProductUuid,
        stock: u64,
    ) -> Result<Product, ProductsServiceError> {
        let mut tables = self.store.write().await;

        let record = tables
            .products
            .get_mut(&product)
            .ok_or(ProductsServiceError::NotFound)?;

        record.stock = stock;
        record.updated_at = Timestamp::now();

        Ok(record.clone())
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError> {
        let mut tables = self.store.write().await;

        if tables.products.remove(&product).is_none() {
            return Err(ProductsServiceError::NotFound);
        }

        // Cascade: cart lines referencing the product disappear with it.
        for cart in tables.carts.values_mut() {
            cart.lines.remove(&product);
        }

        // Order lines keep their captured price but lose the reference.
        for order in tables.orders.values_mut() {
            for line in &mut order.lines {
                if line.product_uuid == Some(product) {
                    line.product_uuid = None;
                }
            }
        }

        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ProductsServiceError> {
        let tables = self.store.read().await;

        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(categories)
    }

    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<Category, ProductsServiceError> {
        let mut tables = self.store.write().await;

        let duplicate = tables.categories.contains_key(&category.uuid)
            || tables
                .categories
                .values()
                .any(|existing| existing.slug == category.slug);

        if duplicate {
            return Err(ProductsServiceError::AlreadyExists);
        }

        let created = Category {
            uuid: category.uuid,
            name: category.name,
            slug: category.slug,
            created_at: Timestamp::now(),
        };

        tables.categories.insert(created.uuid, created.clone());

        Ok(created)
    }
}
