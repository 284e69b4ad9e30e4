use crate::{
    domain::orders::models::{Order, OrderTable},
    store::{RecordStore, StoreError, Transaction, UserMap},
};

#[derive(Debug, Clone)]
pub(crate) struct FileOrdersRepository {
    store: RecordStore<OrderTable>,
}

impl FileOrdersRepository {
    #[must_use]
    pub(crate) fn new(store: RecordStore<OrderTable>) -> Self {
        Self { store }
    }

    pub(crate) async fn all_orders(&self) -> Result<UserMap<Order>, StoreError> {
        Ok(self.store.load().await?.into_collection())
    }

    pub(crate) async fn find_order(&self, user_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.store.load().await?.get(user_id).cloned())
    }

    pub(crate) async fn begin(&self) -> Result<Transaction<OrderTable>, StoreError> {
        self.store.begin().await
    }
}
