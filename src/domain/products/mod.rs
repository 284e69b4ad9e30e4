//! Products

pub mod data;
pub mod errors;
pub mod models;
mod repositories;
pub mod service;

pub use errors::ProductsServiceError;
pub use service::*;
