//! # Photo Sync Module
//!
//! Keeps the feed, the topic list and topic pages in memory, backed by the
//! Local Store, the Remote Source and a snapshot of last-known-good data.
//!
//! ## Overview
//!
//! This module manages:
//! - Local-first loading with bounded, constant-delay retries
//! - Snapshot fallback when both the Local Store and the Remote Source fail
//! - Favorite toggling with a free-tier quota
//! - Per-topic pagination with a free-tier page ceiling
//!
//! ## Components
//!
//! - **Sync Engine** (`engine`): Owns [`SyncState`] and runs every load
//! - **Favorite Manager** (`favorites`): Toggles and clears favorites, keeps the favorites view
//! - **Pagination Controller** (`pagination`): Loads the next page of a topic
//! - **Snapshot Cache** (`snapshot`): JSON snapshots of the feed and topics
//! - **Retry Policy** (`retry`): Explicit bounded retry loop

pub mod config;
pub mod engine;
pub mod error;
pub mod favorites;
pub mod pagination;
pub mod retry;
pub mod snapshot;
pub mod state;

pub use config::SyncConfig;
pub use engine::{PageOutcome, StartupReport, SyncEngine};
pub use error::{Result, SyncError};
pub use favorites::{FavoriteManager, ToggleOutcome};
pub use pagination::{LoadMoreOutcome, PaginationController};
pub use retry::{Retried, RetryExhausted, RetryPolicy};
pub use snapshot::{Snapshot, SnapshotCache, SnapshotKind};
pub use state::{LoadOutcome, LoadPhase, SyncState};
