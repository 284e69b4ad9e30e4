//! Products service errors.

use thiserror::Error;

use crate::{sequence::SequenceError, store::StoreError};

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product not found")]
    NotFound,

    #[error("you do not have permission to access this product")]
    PermissionDenied,

    #[error("invalid product data: {0}")]
    InvalidData(String),

    #[error("unrecognized product field: {0}")]
    UnknownField(String),

    #[error("product does not have {requested} items in inventory; the stock contains {available}")]
    InventoryExhausted { requested: u64, available: u64 },

    #[error("storage error")]
    Store(#[from] StoreError),

    #[error("id generation error")]
    Sequence(#[from] SequenceError),
}
