use crate::{
    domain::products::models::{Category, CategoryTable},
    store::{RecordStore, StoreError},
};

#[derive(Debug, Clone)]
pub(crate) struct FileCategoriesRepository {
    store: RecordStore<CategoryTable>,
}

impl FileCategoriesRepository {
    #[must_use]
    pub(crate) fn new(store: RecordStore<CategoryTable>) -> Self {
        Self { store }
    }

    pub(crate) async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.store.load().await?.collection().iter().cloned().collect())
    }

    pub(crate) async fn find_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        let categories = self.store.load().await?;

        Ok(categories
            .collection()
            .iter()
            .find(|category| category.is_named(name))
            .cloned())
    }

    /// Inserts `category` unless one with the same name appeared meanwhile,
    /// in which case the existing category is returned instead.
    pub(crate) async fn insert_unique(&self, category: Category) -> Result<Category, StoreError> {
        let mut tx = self.store.begin().await?;

        if let Some(existing) = tx
            .collection()
            .iter()
            .find(|existing| existing.is_named(&category.name))
        {
            return Ok(existing.clone());
        }

        tx.upsert(category.id.clone(), category.clone());
        tx.commit().await?;

        Ok(category)
    }
}
