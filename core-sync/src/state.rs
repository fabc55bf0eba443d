//! # Engine State
//!
//! In-memory collections the sync engine materializes, plus the per-collection
//! load state machine.
//!
//! ## Load State Machine
//!
//! ```text
//! Idle → LocalHit
//!   └──→ RemoteAttempt(1) → Succeeded
//!            ↓ (transient failure, n < max)
//!        RemoteAttempt(n+1) → Succeeded
//!            ↓
//!        Exhausted → SnapshotFallback
//! ```
//!
//! `LocalHit`, `Succeeded`, `Exhausted` and `SnapshotFallback` are terminal;
//! a new load always starts again from `Idle`.

use core_library::{FeedPhoto, Photo, PhotoRecord, Topic, TopicPhoto};
use core_runtime::events::Collection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Where a collection load currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", content = "attempt", rename_all = "snake_case")]
pub enum LoadPhase {
    #[default]
    Idle,
    /// The Local Store already held records
    LocalHit,
    /// Remote attempt in flight, 1-based
    RemoteAttempt(u32),
    /// Remote data stored and adopted
    Succeeded,
    /// No attempt left
    Exhausted,
    /// Degraded: last snapshot adopted (possibly empty)
    SnapshotFallback,
}

impl LoadPhase {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: LoadPhase) -> bool {
        match (self, next) {
            // Any terminal phase, or Idle itself, may begin a fresh load.
            (_, LoadPhase::Idle) => true,
            (LoadPhase::Idle, LoadPhase::LocalHit) => true,
            (LoadPhase::Idle, LoadPhase::RemoteAttempt(1)) => true,
            (LoadPhase::RemoteAttempt(n), LoadPhase::RemoteAttempt(m)) => m == n + 1,
            (LoadPhase::RemoteAttempt(_), LoadPhase::Succeeded) => true,
            (LoadPhase::RemoteAttempt(_), LoadPhase::Exhausted) => true,
            (LoadPhase::Exhausted, LoadPhase::SnapshotFallback) => true,
            _ => false,
        }
    }
}

/// The collections that carry a [`LoadPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadTarget {
    Feed,
    Topics,
}

impl LoadTarget {
    pub(crate) fn collection(self) -> Collection {
        match self {
            LoadTarget::Feed => Collection::Feed,
            LoadTarget::Topics => Collection::Topics,
        }
    }
}

/// Terminal result of `load_feed` / `load_topics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Served from the Local Store; no remote call was made.
    LocalHit { count: usize },
    /// Fetched from the Remote Source and stored.
    Remote { count: usize, attempts: u32 },
    /// Remote failed; the last snapshot was adopted.
    Snapshot { count: usize, attempts: u32 },
    /// Remote failed and no snapshot was available.
    Empty { attempts: u32 },
}

impl LoadOutcome {
    /// Records now held in memory for the collection.
    pub fn count(&self) -> usize {
        match self {
            LoadOutcome::LocalHit { count }
            | LoadOutcome::Remote { count, .. }
            | LoadOutcome::Snapshot { count, .. } => *count,
            LoadOutcome::Empty { .. } => 0,
        }
    }

    /// Remote attempts made. Zero for a local hit.
    pub fn attempts(&self) -> u32 {
        match self {
            LoadOutcome::LocalHit { .. } => 0,
            LoadOutcome::Remote { attempts, .. }
            | LoadOutcome::Snapshot { attempts, .. }
            | LoadOutcome::Empty { attempts } => *attempts,
        }
    }

    /// True when the caller got degraded (snapshot or empty) data.
    pub fn is_degraded(&self) -> bool {
        matches!(self, LoadOutcome::Snapshot { .. } | LoadOutcome::Empty { .. })
    }
}

/// Everything the engine holds in memory.
///
/// Owned by the engine behind a single lock; callers receive clones.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    /// Feed photos, in load order
    pub photos: Vec<FeedPhoto>,
    pub topics: Vec<Topic>,
    /// Loaded photos per topic id
    pub topic_photos: HashMap<String, Vec<TopicPhoto>>,
    /// Derived favorites view: feed favorites first, then topic favorites
    pub favorite_photos: Vec<Photo>,
    /// Whether `favorite_photos` has been computed at least once
    pub favorites_loaded: bool,
    /// Highest page successfully loaded per topic
    pub current_page: HashMap<String, u32>,
    pub is_loading: bool,
    pub is_loading_more: bool,
    /// User-facing description of the last failure
    pub error_message: Option<String>,
    pub privileged: bool,
    pub feed_phase: LoadPhase,
    pub topics_phase: LoadPhase,
}

impl SyncState {
    pub fn current_page(&self, topic_id: &str) -> u32 {
        self.current_page.get(topic_id).copied().unwrap_or(0)
    }

    pub fn topic_photos(&self, topic_id: &str) -> &[TopicPhoto] {
        self.topic_photos
            .get(topic_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Moves the target's phase to `next`. Overlapping loads of the same
    /// collection can interleave phases; that is logged, not refused.
    pub(crate) fn set_phase(&mut self, target: LoadTarget, next: LoadPhase) {
        let phase = match target {
            LoadTarget::Feed => &mut self.feed_phase,
            LoadTarget::Topics => &mut self.topics_phase,
        };
        if !phase.can_transition_to(next) {
            warn!(?target, from = ?*phase, to = ?next, "Unexpected load phase transition");
        }
        *phase = next;
    }

    /// Records `page` as loaded unless a later page already is.
    pub(crate) fn mark_page_loaded(&mut self, topic_id: &str, page: u32) {
        let current = self.current_page.entry(topic_id.to_string()).or_insert(0);
        *current = (*current).max(page);
    }

    /// Merges a page into the topic's list, replacing entries with the same
    /// composite id and appending the rest. Returns how many were new.
    pub(crate) fn merge_topic_photos(&mut self, topic_id: &str, photos: Vec<TopicPhoto>) -> usize {
        let list = self.topic_photos.entry(topic_id.to_string()).or_default();
        merge_by_id(list, photos, |photo| photo.id.as_str())
    }

    /// Merges feed photos the same way.
    pub(crate) fn merge_photos(&mut self, photos: Vec<FeedPhoto>) -> usize {
        merge_by_id(&mut self.photos, photos, |photo| photo.id.as_str())
    }

    /// Writes `favorite` into every in-memory copy of the photo with `id`.
    pub(crate) fn apply_favorite(&mut self, photo: &Photo) {
        match photo {
            Photo::Feed(updated) => {
                if let Some(existing) = self.photos.iter_mut().find(|p| p.id == updated.id) {
                    existing.favorite = updated.favorite;
                }
            }
            Photo::Topic(updated) => {
                for list in self.topic_photos.values_mut() {
                    for existing in list.iter_mut().filter(|p| p.id == updated.id) {
                        existing.set_favorite(updated.favorite);
                    }
                }
            }
        }
    }
}

fn merge_by_id<T, K>(list: &mut Vec<T>, incoming: Vec<T>, key: K) -> usize
where
    K: Fn(&T) -> &str,
{
    let mut added = 0;
    for item in incoming {
        match list.iter().position(|existing| key(existing) == key(&item)) {
            Some(index) => list[index] = item,
            None => {
                list.push(item);
                added += 1;
            }
        }
    }
    added
}
