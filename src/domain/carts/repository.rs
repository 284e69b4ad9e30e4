use crate::{
    domain::carts::models::{CartLine, CartTable},
    store::{RecordStore, StoreError, Transaction, UserMap},
};

#[derive(Debug, Clone)]
pub(crate) struct FileCartsRepository {
    store: RecordStore<CartTable>,
}

impl FileCartsRepository {
    #[must_use]
    pub(crate) fn new(store: RecordStore<CartTable>) -> Self {
        Self { store }
    }

    pub(crate) async fn all_carts(&self) -> Result<UserMap<Vec<CartLine>>, StoreError> {
        Ok(self.store.load().await?.into_collection())
    }

    /// A user's lines; `None` when the user has no cart.
    pub(crate) async fn find_cart(&self, user_id: &str) -> Result<Option<Vec<CartLine>>, StoreError> {
        Ok(self
            .store
            .load()
            .await?
            .get(user_id)
            .filter(|lines| !lines.is_empty())
            .cloned())
    }

    pub(crate) async fn begin(&self) -> Result<Transaction<CartTable>, StoreError> {
        self.store.begin().await
    }
}
