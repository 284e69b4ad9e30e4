//! Sequence generator.
//!
//! One counter per entity kind, persisted together in a single counter file.
//! Values are strictly increasing and never reused, even after the entity they
//! named is deleted.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::{RecordStore, StoreError};

/// Entity kinds with an independent counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    Product,
    CartItem,
    Order,
    User,
    Category,
}

impl Display for SequenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Product => "product",
            Self::CartItem => "cart_item",
            Self::Order => "order",
            Self::User => "user",
            Self::Category => "category",
        })
    }
}

/// Counter document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Counters {
    pub user_id: u64,
    pub product_id: u64,
    pub order_id: u64,
    pub cart_id: u64,
    pub category: u64,
}

impl Counters {
    /// Bumps exactly one counter and returns its new value.
    fn increment(&mut self, kind: SequenceKind) -> u64 {
        let counter = match kind {
            SequenceKind::Product => &mut self.product_id,
            SequenceKind::CartItem => &mut self.cart_id,
            SequenceKind::Order => &mut self.order_id,
            SequenceKind::User => &mut self.user_id,
            SequenceKind::Category => &mut self.category,
        };

        *counter += 1;

        *counter
    }
}

#[derive(Debug, Error)]
#[error("failed to generate {kind} id")]
pub struct SequenceError {
    kind: SequenceKind,
    #[source]
    source: StoreError,
}

#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    store: RecordStore<Counters>,
}

impl SequenceGenerator {
    #[must_use]
    pub fn new(store: RecordStore<Counters>) -> Self {
        Self { store }
    }

    /// Returns the next identifier for `kind`.
    ///
    /// A missing or malformed counter file starts over from zeroed counters.
    /// The read-modify-write cycle runs under the counter file's lock, so
    /// concurrent callers never observe the same value.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter file cannot be locked or written.
    #[tracing::instrument(name = "sequence.next_id", skip(self), err)]
    pub async fn next_id(&self, kind: SequenceKind) -> Result<String, SequenceError> {
        let wrap = |source| SequenceError { kind, source };

        let mut tx = match self.store.begin().await {
            Ok(tx) => tx,
            Err(StoreError::Parse { path, source }) => {
                warn!(path = %path.display(), error = %source, "counter file is malformed, resetting counters");

                self.store.begin_default().await.map_err(wrap)?
            }
            Err(error) => return Err(wrap(error)),
        };

        let id = tx.increment(kind);

        tx.commit().await.map_err(wrap)?;

        debug!(id, "issued id");

        Ok(id.to_string())
    }
}
