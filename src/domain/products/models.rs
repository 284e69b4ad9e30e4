//! Product Models

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::{Keyed, RecordList, Table};

/// Product Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    /// Owner of the product.
    pub user_id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub inventory: u64,
}

impl Keyed for Product {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Products file document.
pub type ProductTable = Table<RecordList<Product>>;

/// Category Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub slug: String,
    pub created_at: Timestamp,
}

impl Category {
    /// Case-insensitive name match.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

impl Keyed for Category {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Categories file document.
pub type CategoryTable = Table<RecordList<Category>>;

/// Lowercases `name` and replaces spaces with underscores.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Direction of an inventory adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryDirection {
    /// Take stock out for a cart.
    Reserve,
    /// Return stock from a cart.
    Release,
}

impl InventoryDirection {
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            Self::Reserve => Self::Release,
            Self::Release => Self::Reserve,
        }
    }
}
