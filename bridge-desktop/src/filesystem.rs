//! [`FileSystemAccess`] over `tokio::fs`.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    storage::{FileMetadata, FileSystemAccess},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::trace;

/// Plain host file system, no sandboxing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(fs::try_exists(path).await?)
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await?;
        Ok(FileMetadata {
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            is_directory: metadata.is_dir(),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        Ok(fs::create_dir_all(path).await?)
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await?;
        trace!(path = ?path, bytes = data.len(), "read");
        Ok(data.into())
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        fs::write(path, &data).await?;
        trace!(path = ?path, bytes = data.len(), "wrote");
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        Ok(fs::rename(from, to).await?)
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        Ok(fs::remove_file(path).await?)
    }

    async fn delete_dir_all(&self, path: &Path) -> Result<()> {
        Ok(fs::remove_dir_all(path).await?)
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut children = Vec::new();
        let mut entries = fs::read_dir(path).await?;
        while let Some(entry) = entries.next_entry().await? {
            children.push(entry.path());
        }
        Ok(children)
    }
}
