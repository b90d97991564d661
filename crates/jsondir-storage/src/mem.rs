use crate::traits::Storage;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Map-backed storage for tests and embedding. Directories exist
/// implicitly as prefixes of stored files.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    files: RwLock<HashMap<PathBuf, String>>,
    writes: AtomicU64,
    fail_writes: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.inner.files.write().insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.inner.files.read().get(path).cloned()
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Makes every following write fail until switched off again.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Storage for InMemoryStorage {
    async fn read(&self, path: &Path) -> io::Result<String> {
        self.get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "writes disabled"));
        }
        self.insert(path, contents);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_dir(&self, path: &Path) -> bool {
        self.inner
            .files
            .read()
            .keys()
            .any(|k| k != path && k.starts_with(path))
    }
}
