//! Orders service errors.

use thiserror::Error;

use crate::{sequence::SequenceError, store::StoreError};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("invalid order data: {0}")]
    InvalidData(String),

    #[error("invalid order status {0:?}, expected Pending or Done")]
    InvalidStatus(String),

    #[error("order not found")]
    NotFound,

    #[error("storage error")]
    Store(#[from] StoreError),

    #[error("id generation error")]
    Sequence(#[from] SequenceError),
}
