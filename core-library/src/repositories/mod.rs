//! # Repository Pattern Implementation
//!
//! Repository traits and SQLite implementations for the Local Store.
//!
//! ## Architecture
//!
//! - Traits define the interface for each record type
//! - SQLite implementations use sqlx for async database access
//! - Fetches take a [`RecordFilter`](crate::query::RecordFilter) for
//!   predicate, sort and limit
//! - Multi-row writes run inside a single transaction
//!
//! ## Available Repositories
//!
//! - `FeedPhotoRepository` - Photos from the random feed
//! - `TopicRepository` - Curated topics, replaced wholesale
//! - `TopicPhotoRepository` - Photos under a topic, keyed by composite id
//! - `FavoriteRepository` - Favorite resets spanning both photo tables

use sqlx::SqlitePool;
use std::sync::Arc;

mod columns;
pub mod favorites;
pub mod feed_photo;
pub mod topic;
pub mod topic_photo;

pub use favorites::{FavoriteRepository, SqliteFavoriteRepository, UnfavoriteSummary};
pub use feed_photo::{FeedPhotoRepository, SqliteFeedPhotoRepository};
pub use topic::{SqliteTopicRepository, TopicRepository};
pub use topic_photo::{SqliteTopicPhotoRepository, TopicPhotoRepository};

/// Every repository the sync core needs, behind trait objects.
#[derive(Clone)]
pub struct PhotoLibrary {
    pub feed_photos: Arc<dyn FeedPhotoRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub topic_photos: Arc<dyn TopicPhotoRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
}

impl PhotoLibrary {
    /// SQLite-backed library sharing one pool.
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            feed_photos: Arc::new(SqliteFeedPhotoRepository::new(pool.clone())),
            topics: Arc::new(SqliteTopicRepository::new(pool.clone())),
            topic_photos: Arc::new(SqliteTopicPhotoRepository::new(pool.clone())),
            favorites: Arc::new(SqliteFavoriteRepository::new(pool)),
        }
    }
}

impl std::fmt::Debug for PhotoLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoLibrary").finish_non_exhaustive()
    }
}
