//! Advisory collection locks.

use std::{
    fs::{File, OpenOptions, create_dir_all},
    io,
    path::{Path, PathBuf},
};

use fs2::FileExt;
use tokio::task;
use tracing::{debug, warn};

use super::StoreError;

/// Exclusive lock over one collection file, held for the lifetime of a
/// transaction.
///
/// The lock lives on a `<collection>.lock` sibling so the collection itself
/// can be replaced by rename while the lock is held. Dropping the guard
/// releases it.
#[derive(Debug)]
pub(crate) struct CollectionLock {
    file: File,
    path: PathBuf,
}

impl CollectionLock {
    pub(crate) async fn acquire(collection: &Path) -> Result<Self, StoreError> {
        let path = lock_path(collection);
        let lock_target = path.clone();

        let file = task::spawn_blocking(move || open_locked(&lock_target))
            .await
            .map_err(|error| StoreError::Lock {
                path: path.clone(),
                source: io::Error::other(error),
            })?
            .map_err(|source| StoreError::Lock {
                path: path.clone(),
                source,
            })?;

        debug!(lock = %path.display(), "acquired collection lock");

        Ok(Self { file, path })
    }
}

impl Drop for CollectionLock {
    fn drop(&mut self) {
        if let Err(error) = FileExt::unlock(&self.file) {
            warn!(lock = %self.path.display(), %error, "failed to release collection lock");
        }
    }
}

fn open_locked(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)?;

    FileExt::lock_exclusive(&file)?;

    Ok(file)
}

pub(crate) fn lock_path(collection: &Path) -> PathBuf {
    sibling(collection, "lock")
}

pub(crate) fn sibling(collection: &Path, suffix: &str) -> PathBuf {
    let mut name = collection.file_name().unwrap_or_default().to_os_string();

    name.push(".");
    name.push(suffix);

    collection.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn lock_file_sits_beside_the_collection() {
        let path = lock_path(Path::new("data/cart.json"));

        assert_eq!(path, Path::new("data/cart.json.lock"));
    }

    #[tokio::test]
    async fn lock_is_reacquirable_after_drop() -> testresult::TestResult {
        let dir = tempfile::tempdir()?;
        let collection = dir.path().join("products.json");

        let first = CollectionLock::acquire(&collection).await?;
        drop(first);

        let second = CollectionLock::acquire(&collection).await?;

        assert!(second.path.exists(), "lock file should exist while held");

        Ok(())
    }
}
