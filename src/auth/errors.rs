//! Auth service errors.

use thiserror::Error;

use crate::{sequence::SequenceError, store::StoreError};

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("user not found")]
    NotFound,

    #[error("username already exists")]
    AlreadyExists,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("missing required data: {0}")]
    MissingRequiredData(&'static str),

    #[error("storage error")]
    Store(#[from] StoreError),

    #[error("id generation error")]
    Sequence(#[from] SequenceError),
}
