//! Products service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;

use crate::{
    auth::Caller,
    domain::products::{
        data::{NewProduct, ProductUpdate},
        errors::ProductsServiceError,
        models::{Category, CategoryTable, InventoryDirection, Product, ProductTable, slugify},
        repositories::{FileCategoriesRepository, FileProductsRepository},
    },
    sequence::{SequenceGenerator, SequenceKind},
    store::RecordStore,
};

#[derive(Debug, Clone)]
pub struct FileProductsService {
    products: FileProductsRepository,
    categories: FileCategoriesRepository,
    sequence: SequenceGenerator,
}

impl FileProductsService {
    #[must_use]
    pub fn new(
        products: RecordStore<ProductTable>,
        categories: RecordStore<CategoryTable>,
        sequence: SequenceGenerator,
    ) -> Self {
        Self {
            products: FileProductsRepository::new(products),
            categories: FileCategoriesRepository::new(categories),
            sequence,
        }
    }

    /// Finds a category by name, creating it on first use.
    async fn resolve_category(&self, name: &str) -> Result<Category, ProductsServiceError> {
        if let Some(category) = self.categories.find_by_name(name).await? {
            return Ok(category);
        }

        let category = Category {
            id: self.sequence.next_id(SequenceKind::Category).await?,
            name: name.to_string(),
            description: String::new(),
            slug: slugify(name),
            created_at: Timestamp::now(),
        };

        let category = self.categories.insert_unique(category).await?;

        info!(category_id = %category.id, slug = %category.slug, "created category");

        Ok(category)
    }

    async fn visible_product(
        &self,
        caller: &Caller,
        id: &str,
    ) -> Result<Product, ProductsServiceError> {
        let product = self
            .products
            .get_product(id)
            .await?
            .ok_or(ProductsServiceError::NotFound)?;

        if !caller.can_access(&product.user_id) {
            return Err(ProductsServiceError::PermissionDenied);
        }

        Ok(product)
    }
}

#[async_trait]
impl ProductsService for FileProductsService {
    async fn list_products(&self, caller: Caller) -> Result<Vec<Product>, ProductsServiceError> {
        let products: Vec<Product> = self
            .products
            .list_products()
            .await?
            .into_iter()
            .filter(|product| caller.can_access(&product.user_id))
            .collect();

        if products.is_empty() && !caller.is_admin {
            return Err(ProductsServiceError::NotFound);
        }

        Ok(products)
    }

    async fn get_product(&self, caller: Caller, id: String) -> Result<Product, ProductsServiceError> {
        self.visible_product(&caller, &id).await
    }

    #[tracing::instrument(
        name = "products.service.create_product",
        skip(self, caller, product),
        fields(owner = %caller.user_id, name = %product.name),
        err
    )]
    async fn create_product(
        &self,
        caller: Caller,
        product: NewProduct,
    ) -> Result<Product, ProductsServiceError> {
        product.validate()?;

        let category = match product.category.as_deref() {
            Some(name) => Some(self.resolve_category(name).await?.id),
            None => None,
        };

        let created = Product {
            id: self.sequence.next_id(SequenceKind::Product).await?,
            user_id: caller.user_id,
            name: product.name,
            price: product.price,
            description: product.description,
            category,
            inventory: product.inventory,
        };

        let mut tx = self.products.begin().await?;

        tx.upsert(created.id.clone(), created.clone());
        tx.commit().await?;

        info!(product_id = %created.id, "created product");

        Ok(created)
    }

    #[tracing::instrument(
        name = "products.service.update_product",
        skip(self, caller, update),
        fields(caller = %caller.user_id),
        err
    )]
    async fn update_product(
        &self,
        caller: Caller,
        id: String,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError> {
        if update.is_empty() {
            return Err(ProductsServiceError::InvalidData(
                "no fields to update".to_string(),
            ));
        }

        self.visible_product(&caller, &id).await?;

        let category = match update.category.as_deref() {
            Some(name) => Some(self.resolve_category(name).await?.id),
            None => None,
        };

        let mut tx = self.products.begin().await?;

        let product = tx.get_mut(id.as_str()).ok_or(ProductsServiceError::NotFound)?;

        if !caller.can_access(&product.user_id) {
            return Err(ProductsServiceError::PermissionDenied);
        }

        if let Some(name) = update.name {
            product.name = name;
        }

        if let Some(price) = update.price {
            product.price = price;
        }

        if let Some(description) = update.description {
            product.description = Some(description);
        }

        if let Some(inventory) = update.inventory {
            product.inventory = inventory;
        }

        if category.is_some() {
            product.category = category;
        }

        let updated = product.clone();

        tx.commit().await?;

        info!(product_id = %updated.id, "updated product");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "products.service.delete_product",
        skip(self, caller),
        fields(caller = %caller.user_id),
        err
    )]
    async fn delete_product(
        &self,
        caller: Caller,
        id: String,
    ) -> Result<Product, ProductsServiceError> {
        let mut tx = self.products.begin().await?;

        let owner = tx
            .get(id.as_str())
            .map(|product| product.user_id.clone())
            .ok_or(ProductsServiceError::NotFound)?;

        if !caller.can_access(&owner) {
            return Err(ProductsServiceError::PermissionDenied);
        }

        let removed = tx.remove(id.as_str()).ok_or(ProductsServiceError::NotFound)?;

        tx.commit().await?;

        info!(product_id = %removed.id, "deleted product");

        Ok(removed)
    }

    async fn reserve_for_cart(
        &self,
        id: String,
        quantity: u64,
    ) -> Result<Product, ProductsServiceError> {
        let product = self
            .products
            .get_product(&id)
            .await?
            .ok_or(ProductsServiceError::NotFound)?;

        if product.inventory < quantity {
            return Err(ProductsServiceError::InventoryExhausted {
                requested: quantity,
                available: product.inventory,
            });
        }

        Ok(product)
    }

    #[tracing::instrument(name = "products.service.adjust_inventory", skip(self), err)]
    async fn adjust_inventory(
        &self,
        id: String,
        quantity: u64,
        direction: InventoryDirection,
    ) -> Result<Product, ProductsServiceError> {
        let mut tx = self.products.begin().await?;

        let product = tx.get_mut(id.as_str()).ok_or(ProductsServiceError::NotFound)?;

        product.inventory = match direction {
            InventoryDirection::Reserve => product.inventory.checked_sub(quantity).ok_or(
                ProductsServiceError::InventoryExhausted {
                    requested: quantity,
                    available: product.inventory,
                },
            )?,
            InventoryDirection::Release => product.inventory.checked_add(quantity).ok_or_else(|| {
                ProductsServiceError::InvalidData("inventory overflows".to_string())
            })?,
        };

        let adjusted = product.clone();

        tx.commit().await?;

        info!(product_id = %adjusted.id, inventory = adjusted.inventory, "adjusted inventory");

        Ok(adjusted)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ProductsServiceError> {
        Ok(self.categories.list_categories().await?)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Products visible to `caller`: every product for an admin, otherwise
    /// the caller's own, with [`ProductsServiceError::NotFound`] when there
    /// are none.
    async fn list_products(&self, caller: Caller) -> Result<Vec<Product>, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, caller: Caller, id: String) -> Result<Product, ProductsServiceError>;

    /// Creates a product owned by `caller`.
    async fn create_product(
        &self,
        caller: Caller,
        product: NewProduct,
    ) -> Result<Product, ProductsServiceError>;

    /// Applies `update` to a product the caller owns.
    async fn update_product(
        &self,
        caller: Caller,
        id: String,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError>;

    /// Removes a product the caller owns, returning it.
    async fn delete_product(
        &self,
        caller: Caller,
        id: String,
    ) -> Result<Product, ProductsServiceError>;

    /// Checks that `quantity` units are in stock, without touching inventory.
    async fn reserve_for_cart(
        &self,
        id: String,
        quantity: u64,
    ) -> Result<Product, ProductsServiceError>;

    /// Moves `quantity` units of stock in `direction`.
    async fn adjust_inventory(
        &self,
        id: String,
        quantity: u64,
        direction: InventoryDirection,
    ) -> Result<Product, ProductsServiceError>;

    async fn list_categories(&self) -> Result<Vec<Category>, ProductsServiceError>;
}
