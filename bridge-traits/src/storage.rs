//! File I/O seam, used for snapshot files and cache maintenance.
//!
//! Paths are always absolute and chosen by the core; an adapter only has to
//! honor them. On mobile hosts they point inside the app sandbox.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Bytes on disk; zero for directories
    pub size: u64,
    pub is_directory: bool,
    pub modified_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    async fn exists(&self, path: &Path) -> Result<bool>;

    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Creates or truncates `path`. The parent directory must exist.
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Replaces `to` with `from`. Within one directory readers must see
    /// either the old file or the new one, never a partial write.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    async fn delete_file(&self, path: &Path) -> Result<()>;

    async fn delete_dir_all(&self, path: &Path) -> Result<()>;

    /// Direct children of `path`, in no particular order.
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Sum of file sizes under `path`, recursively.
    async fn directory_size(&self, path: &Path) -> Result<u64> {
        let mut pending = vec![path.to_path_buf()];
        let mut total = 0;

        while let Some(dir) = pending.pop() {
            for entry in self.list_directory(&dir).await? {
                let metadata = self.metadata(&entry).await?;
                if metadata.is_directory {
                    pending.push(entry);
                } else {
                    total += metadata.size;
                }
            }
        }
        Ok(total)
    }
}
