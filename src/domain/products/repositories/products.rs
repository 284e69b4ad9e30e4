use crate::{
    domain::products::models::{Product, ProductTable},
    store::{RecordStore, StoreError, Transaction},
};

#[derive(Debug, Clone)]
pub(crate) struct FileProductsRepository {
    store: RecordStore<ProductTable>,
}

impl FileProductsRepository {
    #[must_use]
    pub(crate) fn new(store: RecordStore<ProductTable>) -> Self {
        Self { store }
    }

    pub(crate) async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.store.load().await?.collection().iter().cloned().collect())
    }

    pub(crate) async fn get_product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.store.load().await?.get(id).cloned())
    }

    pub(crate) async fn begin(&self) -> Result<Transaction<ProductTable>, StoreError> {
        self.store.begin().await
    }
}
