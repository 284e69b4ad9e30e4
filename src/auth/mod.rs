//! Users, sessions and permission checks.

pub mod errors;
pub mod models;
mod repository;
pub mod service;

pub use errors::AuthServiceError;
pub use models::{Caller, Permission, User};
pub use service::*;
