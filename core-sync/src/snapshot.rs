//! # Snapshot Cache
//!
//! Last-known-good copies of the feed and the topic list, used only after both
//! the Local Store and the Remote Source failed to produce data.
//!
//! ## Layout
//!
//! ```text
//! <cache_dir>/snapshots/feed.json
//! <cache_dir>/snapshots/topics.json
//! ```
//!
//! Each file holds a JSON envelope `{ "version", "saved_at", "items" }`. A save
//! writes a temporary sibling first and renames it over the previous file, so
//! a reader sees either the old snapshot or the new one.
//!
//! Loading never fails: a missing, unreadable, corrupt or wrong-version file is
//! logged and reported as `None`.

use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core_library::{FeedPhoto, Topic};
use core_runtime::logging::strip_path;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;

/// Envelope format version
pub const SNAPSHOT_VERSION: u32 = 1;

const SNAPSHOT_DIR: &str = "snapshots";

/// Which collection a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Feed,
    Topics,
}

impl SnapshotKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKind::Feed => "feed.json",
            SnapshotKind::Topics => "topics.json",
        }
    }
}

/// On-disk form, as read back.
#[derive(Debug, Deserialize)]
struct SnapshotEnvelope<T> {
    version: u32,
    saved_at: DateTime<Utc>,
    items: Vec<T>,
}

/// On-disk form, as written. Borrows the items.
#[derive(Debug, Serialize)]
struct SnapshotEnvelopeRef<'a, T> {
    version: u32,
    saved_at: DateTime<Utc>,
    items: &'a [T],
}

/// A snapshot read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub saved_at: DateTime<Utc>,
    pub items: Vec<T>,
}

/// File-backed snapshot store.
pub struct SnapshotCache {
    file_system: Arc<dyn FileSystemAccess>,
    clock: Arc<dyn Clock>,
    dir: PathBuf,
}

impl SnapshotCache {
    /// Snapshots live under `<cache_dir>/snapshots`.
    pub fn new(
        file_system: Arc<dyn FileSystemAccess>,
        clock: Arc<dyn Clock>,
        cache_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            file_system,
            clock,
            dir: cache_dir.as_ref().join(SNAPSHOT_DIR),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub async fn save_feed(&self, photos: &[FeedPhoto]) -> Result<()> {
        self.save(SnapshotKind::Feed, photos).await
    }

    pub async fn save_topics(&self, topics: &[Topic]) -> Result<()> {
        self.save(SnapshotKind::Topics, topics).await
    }

    pub async fn load_feed(&self) -> Option<Snapshot<FeedPhoto>> {
        self.load(SnapshotKind::Feed).await
    }

    pub async fn load_topics(&self) -> Option<Snapshot<Topic>> {
        self.load(SnapshotKind::Topics).await
    }

    /// Overwrites the snapshot for `kind` with `items`.
    pub async fn save<T: Serialize>(&self, kind: SnapshotKind, items: &[T]) -> Result<()> {
        let envelope = SnapshotEnvelopeRef {
            version: SNAPSHOT_VERSION,
            saved_at: self.clock.now(),
            items,
        };
        let data = serde_json::to_vec(&envelope)?;

        self.file_system.create_dir_all(&self.dir).await?;

        let target = self.path_for(kind);
        let temp = self
            .dir
            .join(format!(".{}.{}.tmp", kind.file_name(), Uuid::new_v4()));

        self.file_system
            .write_file(&temp, Bytes::from(data))
            .await?;
        if let Err(e) = self.file_system.rename(&temp, &target).await {
            if let Err(cleanup) = self.file_system.delete_file(&temp).await {
                debug!(error = %cleanup, "Failed to remove temporary snapshot");
            }
            return Err(e.into());
        }

        info!(
            file = %strip_path(&target.to_string_lossy()),
            count = items.len(),
            "Saved snapshot"
        );
        Ok(())
    }

    /// Reads the snapshot for `kind`. Any failure yields `None`.
    pub async fn load<T: DeserializeOwned>(&self, kind: SnapshotKind) -> Option<Snapshot<T>> {
        let path = self.path_for(kind);
        let file = strip_path(&path.to_string_lossy()).to_string();

        match self.file_system.exists(&path).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(%file, "No snapshot on disk");
                return None;
            }
            Err(e) => {
                warn!(%file, error = %e, "Could not check snapshot");
                return None;
            }
        }

        let data = match self.file_system.read_file(&path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(%file, error = %e, "Could not read snapshot");
                return None;
            }
        };

        let envelope: SnapshotEnvelope<T> = match serde_json::from_slice(&data) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(%file, error = %e, "Discarding corrupt snapshot");
                return None;
            }
        };

        if envelope.version != SNAPSHOT_VERSION {
            warn!(
                %file,
                found = envelope.version,
                expected = SNAPSHOT_VERSION,
                "Discarding snapshot with unknown version"
            );
            return None;
        }

        info!(%file, count = envelope.items.len(), "Loaded snapshot");
        Some(Snapshot {
            saved_at: envelope.saved_at,
            items: envelope.items,
        })
    }

    /// Bytes used by all snapshot files.
    pub async fn disk_usage(&self) -> Result<u64> {
        if !self.file_system.exists(&self.dir).await? {
            return Ok(0);
        }
        Ok(self.file_system.directory_size(&self.dir).await?)
    }

    /// Removes every snapshot.
    pub async fn clear(&self) -> Result<()> {
        if self.file_system.exists(&self.dir).await? {
            self.file_system.delete_dir_all(&self.dir).await?;
            info!("Cleared snapshots");
        }
        Ok(())
    }
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::TokioFileSystem;
    use bridge_traits::photos::{PhotoUrls, PhotoUser};
    use bridge_traits::time::FixedClock;
    use chrono::TimeZone;

    fn photo(id: &str) -> FeedPhoto {
        FeedPhoto {
            id: id.to_string(),
            urls: PhotoUrls {
                raw: format!("https://img.test/{id}?raw"),
                full: format!("https://img.test/{id}?full"),
                regular: format!("https://img.test/{id}?regular"),
                small: format!("https://img.test/{id}?small"),
                thumb: format!("https://img.test/{id}?thumb"),
            },
            user: PhotoUser {
                id: "u1".to_string(),
                name: "Ann Lee".to_string(),
                username: "annlee".to_string(),
                bio: Some("Landscapes".to_string()),
                portfolio_url: None,
            },
            favorite: None,
        }
    }

    fn cache(dir: &tempfile::TempDir) -> SnapshotCache {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        SnapshotCache::new(Arc::new(TokioFileSystem::new()), Arc::new(clock), dir.path())
    }

    #[tokio::test]
    async fn test_round_trip_preserves_items_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);

        let mut photos: Vec<_> = ["e", "a", "d", "b", "c"].iter().map(|id| photo(id)).collect();
        photos[1].favorite = Some(true);
        cache.save_feed(&photos).await.unwrap();

        let snapshot = cache.load_feed().await.unwrap();
        assert_eq!(snapshot.items, photos);
        assert_eq!(
            snapshot.saved_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_written_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        cache.save_feed(&[photo("a"), photo("b")]).await.unwrap();

        let raw = std::fs::read(cache.path_for(SnapshotKind::Feed)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();

        assert_eq!(json["version"], SNAPSHOT_VERSION);
        assert_eq!(json["saved_at"], "2024-05-01T12:00:00Z");
        assert_eq!(json["items"][1]["id"], "b");
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);

        cache.save_feed(&[photo("a"), photo("b")]).await.unwrap();
        cache.save_feed(&[photo("c")]).await.unwrap();

        let snapshot = cache.load_feed().await.unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].id, "c");

        // Only the final file remains, no temporaries.
        let entries = std::fs::read_dir(cache.directory()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);

        assert!(cache.load_feed().await.is_none());
        assert!(cache.load_topics().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);

        std::fs::create_dir_all(cache.directory()).unwrap();
        std::fs::write(cache.path_for(SnapshotKind::Feed), b"{\"version\": 1, \"items\": [").unwrap();

        assert!(cache.load_feed().await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_version_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);

        std::fs::create_dir_all(cache.directory()).unwrap();
        std::fs::write(
            cache.path_for(SnapshotKind::Topics),
            br#"{"version": 99, "saved_at": "2024-05-01T12:00:00Z", "items": []}"#,
        )
        .unwrap();

        assert!(cache.load_topics().await.is_none());
    }

    #[tokio::test]
    async fn test_kinds_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);

        let topic = Topic {
            id: "t1".to_string(),
            slug: "nature".to_string(),
            description: None,
            favorite: None,
        };
        cache.save_topics(&[topic.clone()]).await.unwrap();

        assert!(cache.load_feed().await.is_none());
        assert_eq!(cache.load_topics().await.unwrap().items, vec![topic]);
    }

    #[tokio::test]
    async fn test_disk_usage_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);

        assert_eq!(cache.disk_usage().await.unwrap(), 0);

        cache.save_feed(&[photo("a")]).await.unwrap();
        let on_disk = std::fs::metadata(cache.path_for(SnapshotKind::Feed)).unwrap().len();
        assert_eq!(cache.disk_usage().await.unwrap(), on_disk);

        cache.clear().await.unwrap();
        assert_eq!(cache.disk_usage().await.unwrap(), 0);
        assert!(cache.load_feed().await.is_none());
    }
}
