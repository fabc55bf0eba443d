//! Per-topic pagination with the free-tier page ceiling.
//!
//! `is_loading_more` is a single flag for the whole engine: while any
//! "load more" is in flight every other one is refused.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::engine::SyncEngine;
use crate::error::SyncError;
use crate::state::SyncState;

/// Result of [`PaginationController::load_more_topic_photos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadMoreOutcome {
    /// `page` was fetched and `count` photos came back.
    Loaded { page: u32, count: usize },
    /// Another "load more" is in flight.
    AlreadyLoading,
    /// The account may not go past `max_pages`.
    PageLimitReached { max_pages: u32 },
    /// The remote call failed; see `error_message`.
    Failed,
}

#[derive(Clone, Debug)]
pub struct PaginationController {
    engine: SyncEngine,
}

impl PaginationController {
    pub fn new(engine: SyncEngine) -> Self {
        Self { engine }
    }

    /// Always true for privileged accounts, otherwise
    /// `current_page < max_free_pages`.
    pub async fn can_load_more_pages(&self, topic_id: &str) -> bool {
        let state = self.engine.lock().await;
        can_load_more(&state, topic_id, self.engine.config().max_free_pages)
    }

    /// Fetches the page after the topic's current one.
    ///
    /// Results are reconciled by composite id, so a page that overlaps what is
    /// already loaded never duplicates entries. The page counter only moves on
    /// success; the in-flight flag is always cleared.
    #[instrument(skip(self))]
    pub async fn load_more_topic_photos(&self, topic_id: &str) -> LoadMoreOutcome {
        let max_pages = self.engine.config().max_free_pages;

        let page = {
            let mut state = self.engine.lock().await;
            if state.is_loading_more {
                debug!("A load-more is already in flight");
                return LoadMoreOutcome::AlreadyLoading;
            }
            if !can_load_more(&state, topic_id, max_pages) {
                let limit = SyncError::PageLimitReached {
                    topic_id: topic_id.to_string(),
                    max_pages,
                };
                debug!(%limit, "Not loading more");
                return LoadMoreOutcome::PageLimitReached { max_pages };
            }
            state.is_loading_more = true;
            state.current_page(topic_id) + 1
        };

        let page_size = self.engine.config().topic_page_size;
        let result = self.engine.fetch_topic_page(topic_id, page, page_size).await;

        let mut state = self.engine.lock().await;
        state.is_loading_more = false;
        match result {
            Ok(count) => {
                debug!(page, count, "Loaded more topic photos");
                LoadMoreOutcome::Loaded { page, count }
            }
            Err(e) => {
                warn!(page, error = %e, "Failed to load more topic photos");
                state.error_message = Some(format!("Failed to load more photos: {}", e));
                LoadMoreOutcome::Failed
            }
        }
    }
}

fn can_load_more(state: &SyncState, topic_id: &str, max_pages: u32) -> bool {
    state.privileged || state.current_page(topic_id) < max_pages
}
