use std::io;
use std::path::Path;

/// Whole-file access to the documents backing collections.
#[async_trait::async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn read(&self, path: &Path) -> io::Result<String>;

    /// Replaces the file at `path` with `contents`. Implementations must
    /// either leave the old contents in place or write the new ones in
    /// full.
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    async fn is_dir(&self, path: &Path) -> bool;
}
