use crate::traits::Storage;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Filesystem backend. Writes go to a hidden sibling file that is synced
/// and then renamed over the target.
#[derive(Debug, Clone, Default)]
pub struct PersistentStorage;

impl PersistentStorage {
    pub fn new() -> Self {
        Self
    }
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let mut tmp = OsString::from(".");
    tmp.push(name);
    tmp.push(".tmp");
    Ok(path.with_file_name(tmp))
}

#[async_trait::async_trait]
impl Storage for PersistentStorage {
    async fn read(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let tmp = temp_path(path)?;
        let result = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(contents.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        result
    }

    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
