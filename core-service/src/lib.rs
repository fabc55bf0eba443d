//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridges (HTTP, filesystem) and a
//! [`CoreConfig`] into the photo sync core: the SQLite Local Store, the
//! Unsplash Remote Source, the snapshot cache and the event bus. Desktop apps
//! typically enable the `desktop-shims` feature so the bridges default to the
//! `bridge-desktop` implementations.
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_runtime::config::{CoreConfig, SourceApiConfig};
//! use core_service::CoreService;
//! use core_sync::SyncConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/tmp/firstlook/library.db")
//!     .cache_dir("/tmp/firstlook/cache")
//!     .source_api(SourceApiConfig::new("access-key"))
//!     .build()?;
//!
//! let core = CoreService::bootstrap(config, SyncConfig::default()).await?;
//! let report = core.start().await;
//! println!("{} photos in the feed", report.feed.count());
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::time::SystemClock;
use core_library::db::{create_pool, DatabaseConfig};
use core_library::PhotoLibrary;
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream, DEFAULT_EVENT_BUFFER_SIZE};
use core_sync::{
    FavoriteManager, PaginationController, SnapshotCache, StartupReport, SyncConfig, SyncEngine,
};
use provider_unsplash::UnsplashConnector;
use tracing::{info, instrument};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    engine: SyncEngine,
    events: EventBus,
}

impl CoreService {
    /// Opens the Local Store, builds the Remote Source and snapshot cache,
    /// and returns a service whose engine has not loaded anything yet.
    #[instrument(skip_all, fields(database = %config.database_path.display()))]
    pub async fn bootstrap(config: CoreConfig, sync_config: SyncConfig) -> Result<Self> {
        config.validate()?;

        let fs = &config.file_system;
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs.create_dir_all(parent).await?;
            }
        }
        fs.create_dir_all(&config.cache_dir).await?;

        let pool = create_pool(DatabaseConfig::new(&config.database_path)).await?;
        let library = PhotoLibrary::sqlite(pool);

        let source = Arc::new(UnsplashConnector::new(
            config.http_client.clone(),
            config.source_api.clone(),
        ));
        let snapshots = Arc::new(SnapshotCache::new(
            config.file_system.clone(),
            Arc::new(SystemClock),
            &config.cache_dir,
        ));
        let events = EventBus::new(DEFAULT_EVENT_BUFFER_SIZE);

        let engine = SyncEngine::new(library, source, snapshots, events.clone(), sync_config);
        engine.set_privileged(config.privileged).await;

        info!("Core service ready");
        Ok(Self {
            config: Arc::new(config),
            engine,
            events,
        })
    }

    /// Initial load: feed, topics if needed, favorites view.
    pub async fn start(&self) -> StartupReport {
        self.engine.start().await
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn favorites(&self) -> FavoriteManager {
        self.engine.favorites()
    }

    pub fn pagination(&self) -> PaginationController {
        self.engine.pagination()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// New event subscription. Past events are not replayed.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub async fn set_privileged(&self, privileged: bool) {
        self.engine.set_privileged(privileged).await;
    }

    /// Bytes used by snapshot files.
    pub async fn cache_size(&self) -> Result<u64> {
        Ok(self.engine.snapshots().disk_usage().await?)
    }

    /// Deletes every snapshot file. The Local Store is untouched.
    pub async fn clear_cache(&self) -> Result<()> {
        Ok(self.engine.snapshots().clear().await?)
    }
}
