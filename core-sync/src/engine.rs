//! # Sync Engine
//!
//! Local-first loading of the feed, the topic list and topic pages.
//!
//! ## Load Policy
//!
//! ```text
//! load_feed / load_topics
//!   1. Local Store non-empty?  ──yes──> adopt, stop (no remote call)
//!   2. Remote Source, up to 1 + max_retries attempts, constant delay
//!        success ──> upsert into Local Store, adopt, write snapshot
//!   3. exhausted ──> error_message + last snapshot (or empty)
//! ```
//!
//! Loads never return an error. The terminal state is reported as a
//! [`LoadOutcome`], failures are visible through [`SyncEngine::error_message`]
//! and through [`SyncEvent`]s on the event bus.
//!
//! ## State Ownership
//!
//! [`SyncState`] lives behind one async mutex owned by the engine. The lock is
//! never held across a Remote Source call or a retry sleep, so favorite
//! toggles keep being served while a feed load is waiting to retry.

use bridge_traits::photos::PhotoSource;
use core_library::{FeedPhoto, Photo, PhotoLibrary, RecordFilter, Topic, TopicPhoto};
use core_runtime::events::{Collection, CoreEvent, EventBus, LibraryEvent, SyncEvent};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, instrument, warn};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::favorites::{self, FavoriteManager};
use crate::pagination::PaginationController;
use crate::retry::{Retried, RetryExhausted, RetryPolicy};
use crate::snapshot::SnapshotCache;
use crate::state::{LoadOutcome, LoadPhase, LoadTarget, SyncState};

const FEED_UNAVAILABLE: &str = "Unable to load photos. Check your network connection and try again.";
const TOPICS_UNAVAILABLE: &str = "Unable to load topics. Check your network connection and try again.";

/// Result of [`SyncEngine::fetch_topic_photos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PageOutcome {
    /// The Local Store already covered the page; `count` rows were served.
    LocalHit { count: usize },
    /// The page was fetched and reconciled; `count` photos came back.
    Remote { page: u32, count: usize },
    /// The request was rejected or the remote call failed.
    Failed,
}

/// What [`SyncEngine::start`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    pub feed: LoadOutcome,
    /// `None` when topics were already in memory
    pub topics: Option<LoadOutcome>,
    pub favorites: usize,
}

/// Orchestrates Local Store, Remote Source and Snapshot Cache.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SyncEngine {
    library: PhotoLibrary,
    source: Arc<dyn PhotoSource>,
    snapshots: Arc<SnapshotCache>,
    events: EventBus,
    config: SyncConfig,
    retry: RetryPolicy,
    state: Arc<Mutex<SyncState>>,
}

impl SyncEngine {
    pub fn new(
        library: PhotoLibrary,
        source: Arc<dyn PhotoSource>,
        snapshots: Arc<SnapshotCache>,
        events: EventBus,
        config: SyncConfig,
    ) -> Self {
        let retry = RetryPolicy::new(config.max_retries, config.retry_delay);
        Self {
            library,
            source,
            snapshots,
            events,
            config,
            retry,
            state: Arc::new(Mutex::new(SyncState::default())),
        }
    }

    pub fn favorites(&self) -> FavoriteManager {
        FavoriteManager::new(self.clone())
    }

    pub fn pagination(&self) -> PaginationController {
        PaginationController::new(self.clone())
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn snapshots(&self) -> &SnapshotCache {
        &self.snapshots
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn library(&self) -> &PhotoLibrary {
        &self.library
    }

    pub(crate) fn source(&self) -> &Arc<dyn PhotoSource> {
        &self.source
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().await
    }

    pub(crate) fn emit(&self, event: CoreEvent) {
        // No subscriber is not an error.
        self.events.emit(event).ok();
    }

    // ------------------------------------------------------------------
    // Startup
    // ------------------------------------------------------------------

    /// Loads the feed, loads topics if none are in memory, then computes the
    /// favorites view.
    #[instrument(skip(self))]
    pub async fn start(&self) -> StartupReport {
        let feed = self.load_feed().await;
        let topics = self.load_topics_if_needed().await;

        let favorites = {
            let mut state = self.lock().await;
            match favorites::recompute(&self.library, &mut state).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(error = %e, "Could not compute favorites at startup");
                    0
                }
            }
        };

        info!(
            feed = feed.count(),
            topics = topics.map(|t| t.count()),
            favorites,
            "Sync engine started"
        );
        StartupReport {
            feed,
            topics,
            favorites,
        }
    }

    // ------------------------------------------------------------------
    // Feed
    // ------------------------------------------------------------------

    /// Local-first load of the random feed.
    #[instrument(skip(self))]
    pub async fn load_feed(&self) -> LoadOutcome {
        self.begin_load(LoadTarget::Feed).await;

        let local = match self.library.feed_photos.fetch(&RecordFilter::all()).await {
            Ok(local) => local,
            Err(e) => {
                warn!(error = %e, "Local feed query failed; treating as empty");
                Vec::new()
            }
        };

        let outcome = if !local.is_empty() {
            let count = local.len();
            {
                let mut state = self.lock().await;
                state.photos = local;
                state.set_phase(LoadTarget::Feed, LoadPhase::LocalHit);
            }
            self.local_hit(Collection::Feed, count)
        } else {
            let count = self.config.feed_batch_size;
            let result = self
                .fetch_with_retry(LoadTarget::Feed, || async move {
                    Ok(self.source.fetch_random_photos(count).await?)
                })
                .await;

            match result {
                Ok(Retried { value, attempts }) => {
                    let fetched: Vec<FeedPhoto> =
                        value.into_iter().map(FeedPhoto::from_remote).collect();
                    self.adopt_remote_feed(fetched, attempts).await
                }
                Err(exhausted) => self.feed_fallback(exhausted).await,
            }
        };

        self.lock().await.is_loading = false;
        outcome
    }

    async fn adopt_remote_feed(&self, fetched: Vec<FeedPhoto>, attempts: u32) -> LoadOutcome {
        let stored = match self.library.feed_photos.merge_remote(&fetched).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                error!(error = %e, "Failed to store fetched photos");
                None
            }
        };

        let (snapshot, count) = {
            let mut state = self.lock().await;
            match stored {
                Some(stored) => {
                    state.merge_photos(stored);
                }
                None => {
                    state.merge_photos(fetched);
                    state.error_message = Some(FEED_UNAVAILABLE.to_string());
                }
            }
            state.set_phase(LoadTarget::Feed, LoadPhase::Succeeded);
            (state.photos.clone(), state.photos.len())
        };

        if let Err(e) = self.snapshots.save_feed(&snapshot).await {
            warn!(error = %e, "Failed to write feed snapshot");
        }

        self.emit(CoreEvent::Sync(SyncEvent::Completed {
            collection: Collection::Feed,
            count,
        }));
        LoadOutcome::Remote { count, attempts }
    }

    async fn feed_fallback(&self, exhausted: RetryExhausted) -> LoadOutcome {
        self.mark_exhausted(LoadTarget::Feed, &exhausted, FEED_UNAVAILABLE)
            .await;

        match self.snapshots.load_feed().await {
            Some(snapshot) => {
                let count = snapshot.items.len();
                {
                    let mut state = self.lock().await;
                    state.photos = snapshot.items;
                    state.set_phase(LoadTarget::Feed, LoadPhase::SnapshotFallback);
                }
                self.emit(CoreEvent::Sync(SyncEvent::SnapshotFallback {
                    collection: Collection::Feed,
                    count,
                }));
                LoadOutcome::Snapshot {
                    count,
                    attempts: exhausted.attempts,
                }
            }
            None => {
                self.lock()
                    .await
                    .set_phase(LoadTarget::Feed, LoadPhase::SnapshotFallback);
                LoadOutcome::Empty {
                    attempts: exhausted.attempts,
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Topics
    // ------------------------------------------------------------------

    /// Local-first load of the topic list. A remote result replaces the
    /// stored list wholesale.
    #[instrument(skip(self))]
    pub async fn load_topics(&self) -> LoadOutcome {
        self.begin_load(LoadTarget::Topics).await;

        let local = match self.library.topics.fetch(&RecordFilter::all()).await {
            Ok(local) => local,
            Err(e) => {
                warn!(error = %e, "Local topic query failed; treating as empty");
                Vec::new()
            }
        };

        let outcome = if !local.is_empty() {
            let count = local.len();
            {
                let mut state = self.lock().await;
                state.topics = local;
                state.set_phase(LoadTarget::Topics, LoadPhase::LocalHit);
            }
            self.local_hit(Collection::Topics, count)
        } else {
            let per_page = self.config.topic_batch_size;
            let result = self
                .fetch_with_retry(LoadTarget::Topics, || async move {
                    Ok(self.source.fetch_topics(per_page).await?)
                })
                .await;

            match result {
                Ok(Retried { value, attempts }) => {
                    let fetched: Vec<Topic> = value.into_iter().map(Topic::from_remote).collect();
                    self.adopt_remote_topics(fetched, attempts).await
                }
                Err(exhausted) => self.topics_fallback(exhausted).await,
            }
        };

        self.lock().await.is_loading = false;
        outcome
    }

    /// Loads topics only when none are in memory.
    pub async fn load_topics_if_needed(&self) -> Option<LoadOutcome> {
        if !self.lock().await.topics.is_empty() {
            debug!("Topics already loaded");
            return None;
        }
        Some(self.load_topics().await)
    }

    async fn adopt_remote_topics(&self, fetched: Vec<Topic>, attempts: u32) -> LoadOutcome {
        let topics = match self.library.topics.replace_all(&fetched).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(error = %e, "Failed to store fetched topics");
                self.lock().await.error_message = Some(TOPICS_UNAVAILABLE.to_string());
                fetched
            }
        };

        let count = topics.len();
        if let Err(e) = self.snapshots.save_topics(&topics).await {
            warn!(error = %e, "Failed to write topic snapshot");
        }

        {
            let mut state = self.lock().await;
            state.topics = topics;
            state.set_phase(LoadTarget::Topics, LoadPhase::Succeeded);
        }

        self.emit(CoreEvent::Sync(SyncEvent::Completed {
            collection: Collection::Topics,
            count,
        }));
        LoadOutcome::Remote { count, attempts }
    }

    async fn topics_fallback(&self, exhausted: RetryExhausted) -> LoadOutcome {
        self.mark_exhausted(LoadTarget::Topics, &exhausted, TOPICS_UNAVAILABLE)
            .await;

        match self.snapshots.load_topics().await {
            Some(snapshot) => {
                let count = snapshot.items.len();
                {
                    let mut state = self.lock().await;
                    state.topics = snapshot.items;
                    state.set_phase(LoadTarget::Topics, LoadPhase::SnapshotFallback);
                }
                self.emit(CoreEvent::Sync(SyncEvent::SnapshotFallback {
                    collection: Collection::Topics,
                    count,
                }));
                LoadOutcome::Snapshot {
                    count,
                    attempts: exhausted.attempts,
                }
            }
            None => {
                self.lock()
                    .await
                    .set_phase(LoadTarget::Topics, LoadPhase::SnapshotFallback);
                LoadOutcome::Empty {
                    attempts: exhausted.attempts,
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Topic pages
    // ------------------------------------------------------------------

    /// Loads one page of a topic.
    ///
    /// Served locally when the store already holds `page × page_size` rows
    /// for the topic. Otherwise a single remote attempt is made and every
    /// returned photo is reconciled by composite id. Either way the rows are
    /// merged into the in-memory list without duplicating known entries.
    ///
    /// Pages past `max_free_pages` are refused for non-privileged accounts.
    #[instrument(skip(self))]
    pub async fn fetch_topic_photos(&self, topic_id: &str, page: u32, page_size: u32) -> PageOutcome {
        if topic_id.is_empty() || page == 0 || page_size == 0 {
            let e = SyncError::InvalidRequest(format!(
                "topic page request needs a topic id, page >= 1 and page size >= 1 \
                 (got '{}', {}, {})",
                topic_id, page, page_size
            ));
            warn!(error = %e, "Rejected topic page request");
            self.lock().await.error_message = Some(e.to_string());
            return PageOutcome::Failed;
        }

        {
            let mut state = self.lock().await;
            if !state.privileged && page > self.config.max_free_pages {
                let e = SyncError::PageLimitReached {
                    topic_id: topic_id.to_string(),
                    max_pages: self.config.max_free_pages,
                };
                warn!(error = %e, "Rejected topic page request");
                state.error_message = Some(e.to_string());
                return PageOutcome::Failed;
            }
        }

        let wanted = page.saturating_mul(page_size);
        let filter = RecordFilter::all().id_prefix(TopicPhoto::topic_prefix(topic_id));

        match self.library.topic_photos.count(&filter).await {
            Ok(stored) if stored >= i64::from(wanted) => {
                match self.library.topic_photos.fetch(&filter.limit(wanted)).await {
                    Ok(local) => {
                        let count = local.len();
                        {
                            let mut state = self.lock().await;
                            state.merge_topic_photos(topic_id, local);
                            state.mark_page_loaded(topic_id, page);
                        }
                        debug!(topic_id, page, count, "Topic page served locally");
                        return self.local_hit_page(count);
                    }
                    Err(e) => warn!(error = %e, "Local topic page query failed"),
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Local topic page count failed"),
        }

        match self.fetch_topic_page(topic_id, page, page_size).await {
            Ok(count) => PageOutcome::Remote { page, count },
            Err(e) => {
                error!(topic_id, page, error = %e, "Failed to load topic photos");
                self.lock().await.error_message = Some(format!("Failed to load topic photos: {}", e));
                PageOutcome::Failed
            }
        }
    }

    /// One remote attempt for a topic page: reconcile, merge into memory,
    /// advance the page counter. Returns how many photos came back.
    pub(crate) async fn fetch_topic_page(&self, topic_id: &str, page: u32, page_size: u32) -> Result<usize> {
        let fetched = self
            .source
            .fetch_topic_photos(topic_id, page, page_size)
            .await?;

        let photos: Vec<TopicPhoto> = fetched
            .into_iter()
            .map(|remote| TopicPhoto::from_remote(topic_id, remote))
            .collect();
        let stored = self.library.topic_photos.merge_remote(&photos).await?;
        let count = stored.len();

        {
            let mut state = self.lock().await;
            state.merge_topic_photos(topic_id, stored);
            state.mark_page_loaded(topic_id, page);
        }

        self.emit(CoreEvent::Library(LibraryEvent::TopicPageLoaded {
            topic_id: topic_id.to_string(),
            page,
            count,
        }));
        Ok(count)
    }

    fn local_hit_page(&self, count: usize) -> PageOutcome {
        self.emit(CoreEvent::Sync(SyncEvent::LocalHit {
            collection: Collection::TopicPhotos,
            count,
        }));
        PageOutcome::LocalHit { count }
    }

    // ------------------------------------------------------------------
    // Clear all
    // ------------------------------------------------------------------

    /// Deletes every feed photo and topic, then refills the feed with a
    /// single remote attempt.
    ///
    /// Store failures are returned. A failed refill is not: it leaves the
    /// feed empty, sets `error_message` and reports [`LoadOutcome::Empty`].
    #[instrument(skip(self))]
    pub async fn clear_all_photos(&self) -> Result<LoadOutcome> {
        let (photos, topics) = {
            let mut state = self.lock().await;
            let photos = self.library.feed_photos.delete_all().await?;
            state.photos.clear();
            let topics = self.library.topics.delete_all().await?;
            state.topics.clear();
            state.error_message = None;
            favorites::recompute(&self.library, &mut state).await?;
            (photos, topics)
        };

        info!(photos, topics, "Cleared feed and topics");
        self.emit(CoreEvent::Library(LibraryEvent::FeedCleared { photos, topics }));

        let fetched = match self
            .source
            .fetch_random_photos(self.config.clear_refill_count)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                let e = SyncError::from(e);
                error!(error = %e, "Refill after clear failed");
                self.lock().await.error_message = Some(FEED_UNAVAILABLE.to_string());
                return Ok(LoadOutcome::Empty { attempts: 1 });
            }
        };

        let fetched: Vec<FeedPhoto> = fetched.into_iter().map(FeedPhoto::from_remote).collect();
        let stored = self.library.feed_photos.merge_remote(&fetched).await?;

        let snapshot = {
            let mut state = self.lock().await;
            state.merge_photos(stored);
            favorites::recompute(&self.library, &mut state).await?;
            state.photos.clone()
        };

        if let Err(e) = self.snapshots.save_feed(&snapshot).await {
            warn!(error = %e, "Failed to write feed snapshot");
        }

        self.emit(CoreEvent::Sync(SyncEvent::Completed {
            collection: Collection::Feed,
            count: snapshot.len(),
        }));
        Ok(LoadOutcome::Remote {
            count: snapshot.len(),
            attempts: 1,
        })
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// Copy of the whole in-memory state.
    pub async fn state(&self) -> SyncState {
        self.lock().await.clone()
    }

    pub async fn photos(&self) -> Vec<FeedPhoto> {
        self.lock().await.photos.clone()
    }

    pub async fn topics(&self) -> Vec<Topic> {
        self.lock().await.topics.clone()
    }

    pub async fn topic_photos(&self, topic_id: &str) -> Vec<TopicPhoto> {
        self.lock().await.topic_photos(topic_id).to_vec()
    }

    pub async fn current_page(&self, topic_id: &str) -> u32 {
        self.lock().await.current_page(topic_id)
    }

    /// Last recomputed favorites view: feed favorites, then topic favorites.
    pub async fn favorite_photos(&self) -> Vec<Photo> {
        self.lock().await.favorite_photos.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.lock().await.is_loading
    }

    pub async fn is_loading_more(&self) -> bool {
        self.lock().await.is_loading_more
    }

    pub async fn error_message(&self) -> Option<String> {
        self.lock().await.error_message.clone()
    }

    pub async fn set_privileged(&self, privileged: bool) {
        let mut state = self.lock().await;
        if state.privileged != privileged {
            info!(privileged, "Account privilege changed");
        }
        state.privileged = privileged;
    }

    pub async fn is_privileged(&self) -> bool {
        self.lock().await.privileged
    }

    // ------------------------------------------------------------------
    // Shared load steps
    // ------------------------------------------------------------------

    async fn begin_load(&self, target: LoadTarget) {
        {
            let mut state = self.lock().await;
            state.is_loading = true;
            state.error_message = None;
            state.set_phase(target, LoadPhase::Idle);
        }
        self.emit(CoreEvent::Sync(SyncEvent::Started {
            collection: target.collection(),
        }));
    }

    fn local_hit(&self, collection: Collection, count: usize) -> LoadOutcome {
        info!(%collection, count, "Served from local store");
        self.emit(CoreEvent::Sync(SyncEvent::LocalHit { collection, count }));
        LoadOutcome::LocalHit { count }
    }

    /// Runs `fetch` under the retry policy, tracking the collection's phase
    /// and reporting every failed attempt on the bus.
    async fn fetch_with_retry<T, F, Fut>(
        &self,
        target: LoadTarget,
        mut fetch: F,
    ) -> std::result::Result<Retried<T>, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let collection = target.collection();
        let mut attempt = 0;
        self.retry
            .run(
                || {
                    attempt += 1;
                    let current = attempt;
                    let request = fetch();
                    async move {
                        self.lock()
                            .await
                            .set_phase(target, LoadPhase::RemoteAttempt(current));
                        request.await
                    }
                },
                |attempt, error, will_retry| {
                    self.emit(CoreEvent::Sync(SyncEvent::AttemptFailed {
                        collection,
                        attempt,
                        message: error.to_string(),
                        will_retry,
                    }));
                },
            )
            .await
    }

    async fn mark_exhausted(&self, target: LoadTarget, exhausted: &RetryExhausted, message: &str) {
        let collection = target.collection();
        error!(
            %collection,
            attempts = exhausted.attempts,
            error = %exhausted.error,
            "Remote load failed; falling back to snapshot"
        );
        {
            let mut state = self.lock().await;
            state.error_message = Some(message.to_string());
            state.set_phase(target, LoadPhase::Exhausted);
        }
        self.emit(CoreEvent::Sync(SyncEvent::Exhausted {
            collection,
            attempts: exhausted.attempts,
            message: exhausted.error.to_string(),
        }));
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .field("snapshots", &self.snapshots)
            .finish_non_exhaustive()
    }
}
