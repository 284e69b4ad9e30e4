//! Stockroom
//!
//! Product catalog, cart ledger and order ledger kept as flat JSON collection
//! files, with the cross-collection steps (reserving stock, checking out a
//! cart) sequenced so a failure never leaves stock or lines behind.

pub mod auth;
pub mod config;
pub mod context;
pub mod domain;
pub mod sequence;
pub mod store;

#[cfg(test)]
mod test;
