//! Shared fixtures for the sync integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::TokioFileSystem;
use bridge_traits::photos::{
    PhotoSource, PhotoUrls, PhotoUser, RemotePhoto, RemoteTopic, SourceError, SourceResult,
};
use bridge_traits::time::SystemClock;
use core_library::db::create_test_pool;
use core_library::{FeedPhoto, PhotoLibrary};
use core_runtime::events::{EventBus, EventStream};
use core_sync::{SnapshotCache, SyncConfig, SyncEngine};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

// ============================================================================
// Scripted Remote Source
// ============================================================================

struct Failure {
    error: SourceError,
    /// `None` fails forever
    remaining: Option<u32>,
}

/// Remote Source double with call counters and scripted failures.
///
/// - Random photos get fresh ids `r0`, `r1`, ... across calls.
/// - Topics are `t0..t{n}`.
/// - Topic page `p` of size `n` holds photos `x{(p-1)*n}..x{p*n}`, or always
///   `x0..x{n}` when `repeat_pages` is set.
#[derive(Default)]
pub struct ScriptedSource {
    pub random_calls: AtomicU32,
    pub topic_calls: AtomicU32,
    pub page_calls: AtomicU32,
    next_photo: AtomicU32,
    repeat_pages: AtomicBool,
    failure: Mutex<Option<Failure>>,
    page_gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call fails with `error`.
    pub fn fail_with(&self, error: SourceError) {
        *self.failure.lock().unwrap() = Some(Failure {
            error,
            remaining: None,
        });
    }

    /// The next `times` calls fail with `error`.
    pub fn fail_times(&self, times: u32, error: SourceError) {
        *self.failure.lock().unwrap() = Some(Failure {
            error,
            remaining: Some(times),
        });
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn repeat_pages(&self) {
        self.repeat_pages.store(true, Ordering::SeqCst);
    }

    /// Topic page calls wait on `gate` before answering.
    pub fn gate_pages(&self, gate: Arc<Notify>) {
        *self.page_gate.lock().unwrap() = Some(gate);
    }

    pub fn calls(&self) -> u32 {
        self.random_calls.load(Ordering::SeqCst)
            + self.topic_calls.load(Ordering::SeqCst)
            + self.page_calls.load(Ordering::SeqCst)
    }

    fn next_failure(&self) -> Option<SourceError> {
        let mut guard = self.failure.lock().unwrap();
        let failure = guard.as_mut()?;
        match failure.remaining.as_mut() {
            None => Some(failure.error.clone()),
            Some(0) => None,
            Some(left) => {
                *left -= 1;
                Some(failure.error.clone())
            }
        }
    }
}

#[async_trait]
impl PhotoSource for ScriptedSource {
    async fn fetch_random_photos(&self, count: u32) -> SourceResult<Vec<RemotePhoto>> {
        self.random_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.next_failure() {
            return Err(error);
        }
        Ok((0..count)
            .map(|_| {
                let n = self.next_photo.fetch_add(1, Ordering::SeqCst);
                remote_photo(&format!("r{n}"))
            })
            .collect())
    }

    async fn fetch_topics(&self, per_page: u32) -> SourceResult<Vec<RemoteTopic>> {
        self.topic_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.next_failure() {
            return Err(error);
        }
        Ok((0..per_page)
            .map(|i| RemoteTopic {
                id: format!("t{i}"),
                slug: format!("topic-{i}"),
                description: Some(format!("Topic number {i}")),
            })
            .collect())
    }

    async fn fetch_topic_photos(
        &self,
        _topic_id: &str,
        page: u32,
        per_page: u32,
    ) -> SourceResult<Vec<RemotePhoto>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.page_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = self.next_failure() {
            return Err(error);
        }

        let start = if self.repeat_pages.load(Ordering::SeqCst) {
            0
        } else {
            (page - 1) * per_page
        };
        Ok((start..start + per_page)
            .map(|n| remote_photo(&format!("x{n}")))
            .collect())
    }
}

// ============================================================================
// Records
// ============================================================================

pub fn remote_photo(id: &str) -> RemotePhoto {
    RemotePhoto {
        id: id.to_string(),
        urls: PhotoUrls {
            raw: format!("https://images.test/{id}?fm=raw"),
            full: format!("https://images.test/{id}?q=85"),
            regular: format!("https://images.test/{id}?w=1080"),
            small: format!("https://images.test/{id}?w=400"),
            thumb: format!("https://images.test/{id}?w=200"),
        },
        user: PhotoUser {
            id: format!("user-{id}"),
            name: "Mia Chen".to_string(),
            username: "miachen".to_string(),
            bio: None,
            portfolio_url: None,
        },
    }
}

pub fn feed_photo(id: &str) -> FeedPhoto {
    FeedPhoto::from_remote(remote_photo(id))
}

pub fn network_down() -> SourceError {
    SourceError::Network("connection refused".to_string())
}

// ============================================================================
// Harness
// ============================================================================

/// Defaults with a short retry delay.
pub fn fast_config() -> SyncConfig {
    SyncConfig {
        retry_delay: Duration::from_millis(5),
        ..SyncConfig::default()
    }
}

pub struct Harness {
    pub engine: SyncEngine,
    pub source: Arc<ScriptedSource>,
    pub library: PhotoLibrary,
    pub events: EventBus,
    _cache_dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(fast_config()).await
    }

    pub async fn with_config(config: SyncConfig) -> Self {
        Self::with_library(config, |library| library).await
    }

    /// Lets a test swap repositories in the SQLite-backed library.
    pub async fn with_library<F>(config: SyncConfig, wrap: F) -> Self
    where
        F: FnOnce(PhotoLibrary) -> PhotoLibrary,
    {
        let pool = create_test_pool().await.unwrap();
        let library = wrap(PhotoLibrary::sqlite(pool));
        let source = ScriptedSource::new();
        let events = EventBus::default();

        let cache_dir = tempfile::tempdir().unwrap();
        let snapshots = SnapshotCache::new(
            Arc::new(TokioFileSystem::new()),
            Arc::new(SystemClock),
            cache_dir.path(),
        );

        let engine = SyncEngine::new(
            library.clone(),
            source.clone(),
            Arc::new(snapshots),
            events.clone(),
            config,
        );

        Self {
            engine,
            source,
            library,
            events,
            _cache_dir: cache_dir,
        }
    }

    pub fn stream(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Stores `count` feed photos `f00`, `f01`, ... directly in the Local Store.
    pub async fn seed_feed(&self, count: usize) -> Vec<FeedPhoto> {
        let mut photos = Vec::with_capacity(count);
        for i in 0..count {
            let photo = feed_photo(&format!("f{i:02}"));
            self.library.feed_photos.insert_or_replace(&photo).await.unwrap();
            photos.push(photo);
        }
        photos
    }
}
