//! Carts service errors.

use thiserror::Error;

use crate::{
    domain::products::ProductsServiceError, sequence::SequenceError, store::StoreError,
};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("invalid cart data: {0}")]
    InvalidData(String),

    #[error("user has not added anything to the cart yet")]
    NotFound,

    #[error("product {0} is not in the cart")]
    LineNotFound(String),

    #[error(transparent)]
    Products(#[from] ProductsServiceError),

    #[error("storage error")]
    Store(#[from] StoreError),

    #[error("id generation error")]
    Sequence(#[from] SequenceError),
}
