//! Storage configuration.

use std::path::PathBuf;

use clap::Args;

use crate::{
    auth::models::{Session, UserTable},
    domain::{
        carts::models::CartTable,
        orders::models::OrderTable,
        products::models::{CategoryTable, ProductTable},
    },
    sequence::Counters,
    store::RecordStore,
};

const PRODUCTS_FILE: &str = "products.json";
const CATEGORIES_FILE: &str = "category.json";
const CARTS_FILE: &str = "cart.json";
const ORDERS_FILE: &str = "orders.json";
const COUNTERS_FILE: &str = "utils.json";
const USERS_FILE: &str = "users.json";
const SESSION_FILE: &str = "sessionuser.json";

/// Where the collection files live.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Directory holding the collection files
    #[arg(long, env = "STOCKROOM_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,
}

impl StoreConfig {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn products(&self) -> RecordStore<ProductTable> {
        RecordStore::new(self.data_dir.join(PRODUCTS_FILE))
    }

    pub fn categories(&self) -> RecordStore<CategoryTable> {
        RecordStore::new(self.data_dir.join(CATEGORIES_FILE))
    }

    pub fn carts(&self) -> RecordStore<CartTable> {
        RecordStore::new(self.data_dir.join(CARTS_FILE))
    }

    pub fn orders(&self) -> RecordStore<OrderTable> {
        RecordStore::new(self.data_dir.join(ORDERS_FILE))
    }

    pub fn counters(&self) -> RecordStore<Counters> {
        RecordStore::new(self.data_dir.join(COUNTERS_FILE))
    }

    pub fn users(&self) -> RecordStore<UserTable> {
        RecordStore::new(self.data_dir.join(USERS_FILE))
    }

    pub fn session(&self) -> RecordStore<Session> {
        RecordStore::new(self.data_dir.join(SESSION_FILE))
    }
}
