//! Orders Data

use crate::domain::orders::models::{Order, OrderLine, OrderStatus};

/// New Order Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: String,
    pub items: Vec<OrderLine>,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// Status change for the listed products of one order.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOrder {
    pub product_ids: Vec<String>,
    pub status: OrderStatus,
}

/// Result of a deletion request.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionOutcome {
    /// Product ids whose lines were dropped.
    pub removed: Vec<String>,
    /// Product ids kept because their line is `Done`.
    pub skipped_final: Vec<String>,
    /// The order as persisted afterwards.
    pub order: Order,
}

/// Result of storing a new order or merging into an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    /// The order as persisted afterwards.
    pub order: Order,
    /// Product ids whose lines were taken into the order. Lines for products
    /// that were already ordered are not among them.
    pub accepted: Vec<String>,
}
