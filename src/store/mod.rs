//! Flat-file record store.
//!
//! Every collection is a single JSON document. Reads load and index the whole
//! document; mutations run inside a [`Transaction`] that holds the
//! collection's advisory lock from the read until the full document has been
//! rewritten (temp file, then rename over the original).

use std::{
    fmt,
    io::ErrorKind,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::{debug, info};

mod collections;
mod errors;
mod lock;

pub use collections::{Collection, Keyed, RecordList, Table, UserMap};
pub use errors::StoreError;

use lock::{CollectionLock, sibling};

/// A JSON document that can live in a collection file.
///
/// `Default` is the document written when the file does not exist yet.
pub trait Document: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

impl<D> Document for D where D: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

/// Handle on one collection file.
pub struct RecordStore<D> {
    path: PathBuf,
    _document: PhantomData<fn() -> D>,
}

impl<D> Clone for RecordStore<D> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _document: PhantomData,
        }
    }
}

impl<D> fmt::Debug for RecordStore<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore").field("path", &self.path).finish()
    }
}

impl<D: Document> RecordStore<D> {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _document: PhantomData,
        }
    }

    /// Location of the collection file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current document, creating the file with the default
    /// document when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Parse`] for a malformed file and
    /// [`StoreError::Io`] when the file cannot be read or created.
    pub async fn load(&self) -> Result<D, StoreError> {
        match read_document(&self.path).await? {
            Some(document) => Ok(document),
            None => {
                let document = D::default();

                create_document(&self.path, &document).await?;

                Ok(document)
            }
        }
    }

    /// Locks the collection and reads it for modification.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be taken or the document cannot
    /// be read.
    pub async fn begin(&self) -> Result<Transaction<D>, StoreError> {
        let lock = CollectionLock::acquire(&self.path).await?;
        let document = read_document(&self.path).await?.unwrap_or_default();

        Ok(Transaction {
            document,
            path: self.path.clone(),
            _lock: lock,
        })
    }

    /// Locks the collection and starts from the default document, ignoring
    /// whatever is on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be taken.
    pub async fn begin_default(&self) -> Result<Transaction<D>, StoreError> {
        let lock = CollectionLock::acquire(&self.path).await?;

        Ok(Transaction {
            document: D::default(),
            path: self.path.clone(),
            _lock: lock,
        })
    }
}

/// Exclusive, in-memory working copy of a collection.
///
/// Dropping a transaction without calling [`Transaction::commit`] discards
/// every change and leaves the file untouched.
pub struct Transaction<D> {
    document: D,
    path: PathBuf,
    _lock: CollectionLock,
}

impl<D> fmt::Debug for Transaction<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction").field("path", &self.path).finish_non_exhaustive()
    }
}

impl<D: Document> Transaction<D> {
    /// Rewrites the whole collection file and releases the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded or written.
    pub async fn commit(self) -> Result<D, StoreError> {
        write_document(&self.path, &self.document).await?;

        Ok(self.document)
    }
}

impl<D> Deref for Transaction<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.document
    }
}

impl<D> DerefMut for Transaction<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.document
    }
}

/// `Ok(None)` when the file is missing or blank.
async fn read_document<D: Document>(path: &Path) -> Result<Option<D>, StoreError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(StoreError::io(path, error)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    debug!(path = %path.display(), bytes = bytes.len(), "read collection");

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_document<D: Document>(path: &Path, document: &D) -> Result<(), StoreError> {
    let bytes = encode(document)?;
    let staging = sibling(path, "tmp");

    ensure_parent(path).await?;

    fs::write(&staging, &bytes)
        .await
        .map_err(|error| StoreError::io(&staging, error))?;

    fs::rename(&staging, path)
        .await
        .map_err(|error| StoreError::io(path, error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "wrote collection");

    Ok(())
}

/// Creates the file with `document` unless another writer got there first.
async fn create_document<D: Document>(path: &Path, document: &D) -> Result<(), StoreError> {
    let bytes = encode(document)?;
    let staging = sibling(path, &format!("{}.init", std::process::id()));

    ensure_parent(path).await?;

    fs::write(&staging, &bytes)
        .await
        .map_err(|error| StoreError::io(&staging, error))?;

    let linked = fs::hard_link(&staging, path).await;

    fs::remove_file(&staging)
        .await
        .map_err(|error| StoreError::io(&staging, error))?;

    match linked {
        Ok(()) => {
            info!(path = %path.display(), "created collection with default data");

            Ok(())
        }
        Err(error) if error.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(error) => Err(StoreError::io(path, error)),
    }
}

fn encode<D: Document>(document: &D) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(document).map_err(StoreError::Encode)
}

async fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .map_err(|error| StoreError::io(parent, error)),
        _ => Ok(()),
    }
}
