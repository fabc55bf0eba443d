//! # Favorite Manager
//!
//! Favorite toggling over both photo kinds, the free-tier quota, and the
//! derived favorites view.
//!
//! The view is never patched incrementally. Every mutation ends with
//! [`recompute`], which queries both photo tables for `favorite = true`.

use core_library::repositories::UnfavoriteSummary;
use core_library::{Photo, PhotoLibrary, PhotoRecord, RecordFilter};
use core_runtime::events::{CoreEvent, LibraryEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::engine::SyncEngine;
use crate::error::{Result, SyncError};
use crate::state::SyncState;

/// Result of [`FavoriteManager::toggle_favorite`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The flag was flipped and persisted. `photo` carries the new state.
    Changed { photo: Photo, favorite: bool },
    /// The quota is full; nothing was written.
    Rejected { limit: usize },
    /// The Local Store refused the write; see `error_message`.
    Failed,
}

/// Rebuilds `state.favorite_photos` from the Local Store: feed favorites
/// first, then topic favorites, each in ascending id order.
pub(crate) async fn recompute(library: &PhotoLibrary, state: &mut SyncState) -> Result<usize> {
    let feed = library.feed_photos.fetch(&RecordFilter::favorites()).await?;
    let topic = library.topic_photos.fetch(&RecordFilter::favorites()).await?;

    state.favorite_photos = feed
        .into_iter()
        .map(Photo::Feed)
        .chain(topic.into_iter().map(Photo::Topic))
        .collect();
    state.favorites_loaded = true;

    debug!(count = state.favorite_photos.len(), "Recomputed favorites");
    Ok(state.favorite_photos.len())
}

fn limit_reached(state: &SyncState, quota: usize) -> bool {
    !state.privileged && state.favorite_photos.len() >= quota
}

/// Favorite operations bound to one engine.
#[derive(Clone, Debug)]
pub struct FavoriteManager {
    engine: SyncEngine,
}

impl FavoriteManager {
    pub fn new(engine: SyncEngine) -> Self {
        Self { engine }
    }

    /// Flips the favorite flag of `photo`.
    ///
    /// The stored copy, when there is one, is the source of truth for the
    /// current flag. Favoriting is refused for a non-privileged account whose
    /// favorites view already holds `favorite_quota` photos; unfavoriting is
    /// always allowed.
    #[instrument(skip(self, photo), fields(photo_id = %photo.id()))]
    pub async fn toggle_favorite(&self, photo: &Photo) -> ToggleOutcome {
        let library = self.engine.library();
        let quota = self.engine.config().favorite_quota;
        let mut state = self.engine.lock().await;

        if !state.favorites_loaded {
            if let Err(e) = recompute(library, &mut state).await {
                warn!(error = %e, "Could not compute favorites before toggle");
            }
        }

        let current = match stored_copy(library, photo).await {
            Ok(Some(stored)) => stored,
            Ok(None) => photo.clone(),
            Err(e) => {
                warn!(error = %e, "Failed to read photo before toggle");
                state.error_message = Some(e.to_string());
                return ToggleOutcome::Failed;
            }
        };

        let was_favorite = current.is_favorite();
        if !was_favorite && limit_reached(&state, quota) {
            let rejection = SyncError::QuotaExceeded { limit: quota };
            info!(limit = quota, "Favorite rejected");
            state.error_message = Some(rejection.to_string());
            drop(state);

            self.engine
                .emit(CoreEvent::Library(LibraryEvent::FavoriteRejected {
                    photo_id: current.id().to_string(),
                    limit: quota,
                }));
            return ToggleOutcome::Rejected { limit: quota };
        }

        let favorite = !was_favorite;
        let mut updated = current;
        updated.set_favorite(Some(favorite));

        let written = match &updated {
            Photo::Feed(photo) => library.feed_photos.insert_or_replace(photo).await,
            Photo::Topic(photo) => library.topic_photos.insert_or_replace(photo).await,
        };
        if let Err(e) = written {
            warn!(error = %e, "Failed to persist favorite");
            state.error_message = Some(SyncError::from(e).to_string());
            return ToggleOutcome::Failed;
        }

        state.apply_favorite(&updated);
        if let Err(e) = recompute(library, &mut state).await {
            warn!(error = %e, "Could not recompute favorites after toggle");
        }
        drop(state);

        info!(favorite, "Favorite changed");
        self.engine
            .emit(CoreEvent::Library(LibraryEvent::FavoriteChanged {
                photo_id: updated.id().to_string(),
                favorite,
            }));
        ToggleOutcome::Changed {
            photo: updated,
            favorite,
        }
    }

    /// Clears the flag on every in-memory feed photo and every stored topic
    /// photo, in one transaction.
    #[instrument(skip(self))]
    pub async fn unfavorite_all_photos(&self) -> Result<UnfavoriteSummary> {
        let library = self.engine.library();
        let mut state = self.engine.lock().await;

        let feed_ids: Vec<String> = state.photos.iter().map(|p| p.id.clone()).collect();
        let summary = library.favorites.unfavorite_all(&feed_ids).await?;

        for photo in state.photos.iter_mut() {
            photo.favorite = Some(false);
        }
        for list in state.topic_photos.values_mut() {
            for photo in list.iter_mut() {
                photo.favorite = Some(false);
            }
        }
        recompute(library, &mut state).await?;
        drop(state);

        info!(
            feed_photos = summary.feed_photos,
            topic_photos = summary.topic_photos,
            "Cleared all favorites"
        );
        self.engine
            .emit(CoreEvent::Library(LibraryEvent::FavoritesCleared {
                feed_photos: summary.feed_photos,
                topic_photos: summary.topic_photos,
            }));
        Ok(summary)
    }

    /// `not privileged AND favorites >= quota`, against the last recomputed
    /// view.
    pub async fn has_reached_favorite_limit(&self) -> bool {
        let state = self.engine.lock().await;
        limit_reached(&state, self.engine.config().favorite_quota)
    }

    pub async fn favorites_count(&self) -> usize {
        self.engine.lock().await.favorite_photos.len()
    }

    /// Re-queries the Local Store and returns the new view size.
    pub async fn recompute_favorites(&self) -> Result<usize> {
        let mut state = self.engine.lock().await;
        recompute(self.engine.library(), &mut state).await
    }
}

async fn stored_copy(library: &PhotoLibrary, photo: &Photo) -> Result<Option<Photo>> {
    Ok(match photo {
        Photo::Feed(p) => library.feed_photos.find_by_id(&p.id).await?.map(Photo::Feed),
        Photo::Topic(p) => library.topic_photos.find_by_id(&p.id).await?.map(Photo::Topic),
    })
}
