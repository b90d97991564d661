use crate::collection::{resolve_file_path, Collection, CollectionOptions};
use crate::discover::discover;
use jsondir_core::{CollectionEntry, LoadError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

type FileLock = Arc<tokio::sync::Mutex<()>>;
type LockMap = Arc<Mutex<HashMap<PathBuf, FileLock>>>;

/// Entry point for request handlers: loads collections fresh on every
/// call and serializes writers per backing file.
#[derive(Clone)]
pub struct Collections {
    options: CollectionOptions,
    locks: LockMap,
}

/// A collection loaded under its file's write lock. The lock is released
/// when this value is dropped.
pub struct LockedCollection {
    collection: Collection,
    _guard: FileGuard,
}

/// Holds one file's lock and drops the registry entry once no other task
/// is holding or waiting for it.
struct FileGuard {
    locks: LockMap,
    file_path: PathBuf,
    lock: FileLock,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock();
        // one reference in the map, one here
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.file_path);
        }
    }
}

impl Deref for LockedCollection {
    type Target = Collection;

    fn deref(&self) -> &Collection {
        &self.collection
    }
}

impl DerefMut for LockedCollection {
    fn deref_mut(&mut self) -> &mut Collection {
        &mut self.collection
    }
}

impl Collections {
    pub fn new(options: CollectionOptions) -> Self {
        Self {
            options,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    /// Loads without locking. Writes replace files atomically, so readers
    /// see either the previous or the next version.
    pub async fn load(&self, url_path: &str) -> Result<Collection, LoadError> {
        Collection::load(url_path, &self.options).await
    }

    /// Loads while holding the per-file write lock, so that concurrent
    /// writers cannot overwrite each other's changes.
    pub async fn load_for_write(&self, url_path: &str) -> Result<LockedCollection, LoadError> {
        let file_path = resolve_file_path(
            &self.options.base_dir,
            url_path,
            self.options.storage.as_ref(),
        )
        .await?;
        let lock = self.locks.lock().entry(file_path.clone()).or_default().clone();
        let mut guard = FileGuard {
            locks: self.locks.clone(),
            file_path,
            lock: lock.clone(),
            guard: None,
        };
        guard.guard = Some(lock.lock_owned().await);
        // a failed load drops `guard` here and prunes the entry
        let collection = Collection::load(url_path, &self.options).await?;
        Ok(LockedCollection {
            collection,
            _guard: guard,
        })
    }

    pub fn discover(&self) -> Vec<CollectionEntry> {
        discover(&self.options.base_dir)
    }

    /// Files currently held or awaited by a writer.
    pub fn locked_files(&self) -> usize {
        self.locks.lock().len()
    }
}
