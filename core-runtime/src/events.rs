//! # Event Bus System
//!
//! Typed events published by the photo-sync core over `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps one enum per domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Receiver wrapper with optional filtering
//!
//! Hosts subscribe to observe the sync state machine (local hit, remote
//! attempts, snapshot fallback) and favorite/pagination changes without
//! polling the engine.
//!
//! ```text
//! ┌─────────────┐     emit      ┌───────────┐     subscribe    ┌────────────┐
//! │ Sync Engine ├──────────────>│ EventBus  ├─────────────────>│ Subscriber │
//! └─────────────┘               │ (broadcast│                  └────────────┘
//! ┌─────────────┐     emit      │  channel) │     subscribe    ┌────────────┐
//! │ Favorites   ├──────────────>│           ├─────────────────>│ Subscriber │
//! └─────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{Collection, CoreEvent, EventBus, SyncEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Sync(SyncEvent::Started {
//!         collection: Collection::Feed,
//!     }))
//!     .ok();
//!
//! assert!(subscriber.try_recv().is_ok());
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n`
//!   events. Non-fatal.
//! - **`RecvError::Closed`**: all senders dropped. Treat as shutdown.
//!
//! `emit` fails only when nobody is subscribed; publishers ignore that with
//! `.ok()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Load, retry and fallback progress
    Sync(SyncEvent),
    /// Favorite and pagination changes
    Library(LibraryEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Sync(SyncEvent::Exhausted { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::AttemptFailed { .. })
            | CoreEvent::Sync(SyncEvent::SnapshotFallback { .. })
            | CoreEvent::Library(LibraryEvent::FavoriteRejected { .. }) => EventSeverity::Warning,
            CoreEvent::Sync(SyncEvent::Completed { .. })
            | CoreEvent::Library(LibraryEvent::FeedCleared { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Collection a sync event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Feed,
    Topics,
    TopicPhotos,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Collection::Feed => "feed",
            Collection::Topics => "topics",
            Collection::TopicPhotos => "topic_photos",
        })
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Progress of a collection load through its state machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// A load began.
    Started { collection: Collection },
    /// The Local Store already held records; no remote call was made.
    LocalHit {
        collection: Collection,
        count: usize,
    },
    /// One remote attempt failed.
    AttemptFailed {
        collection: Collection,
        /// 1-based attempt number
        attempt: u32,
        message: String,
        /// Whether another attempt will follow
        will_retry: bool,
    },
    /// Remote data was stored and adopted.
    Completed {
        collection: Collection,
        count: usize,
    },
    /// Every attempt failed or the failure was not retryable.
    Exhausted {
        collection: Collection,
        attempts: u32,
        message: String,
    },
    /// State was restored from the last snapshot.
    SnapshotFallback {
        collection: Collection,
        count: usize,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Started { .. } => "Load started",
            SyncEvent::LocalHit { .. } => "Served from local store",
            SyncEvent::AttemptFailed { .. } => "Remote attempt failed",
            SyncEvent::Completed { .. } => "Remote load completed",
            SyncEvent::Exhausted { .. } => "Remote attempts exhausted",
            SyncEvent::SnapshotFallback { .. } => "Restored from snapshot",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Favorite and pagination changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// A photo's favorite flag was flipped and persisted.
    FavoriteChanged { photo_id: String, favorite: bool },
    /// Favoriting was refused because the quota is full.
    FavoriteRejected { photo_id: String, limit: usize },
    /// Every favorite was cleared.
    FavoritesCleared {
        feed_photos: u64,
        topic_photos: u64,
    },
    /// A topic page was appended.
    TopicPageLoaded {
        topic_id: String,
        page: u32,
        count: usize,
    },
    /// All feed photos and topics were deleted.
    FeedCleared { photos: u64, topics: u64 },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::FavoriteChanged { .. } => "Favorite changed",
            LibraryEvent::FavoriteRejected { .. } => "Favorite rejected by quota",
            LibraryEvent::FavoritesCleared { .. } => "All favorites cleared",
            LibraryEvent::TopicPageLoaded { .. } => "Topic page loaded",
            LibraryEvent::FeedCleared { .. } => "Feed and topics cleared",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel. Cheap to clone; clones share the channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// `capacity` is the per-subscriber buffer; a subscriber further behind
    /// than this receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional filter.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Drains every buffered event that passes the filter, without waiting.
    ///
    /// Lagged gaps are skipped.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        events.push(event);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return events,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(collection: Collection) -> CoreEvent {
        CoreEvent::Sync(SyncEvent::Started { collection })
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_an_error() {
        let bus = EventBus::new(8);
        assert!(bus.emit(started(Collection::Feed)).is_err());
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_event() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.emit(started(Collection::Topics)).unwrap(), 2);
        assert_eq!(a.recv().await.unwrap(), started(Collection::Topics));
        assert_eq!(b.recv().await.unwrap(), started(Collection::Topics));
    }

    #[tokio::test]
    async fn test_stream_filter() {
        let bus = EventBus::new(8);
        let mut stream =
            EventStream::new(bus.subscribe()).filter(|e| matches!(e, CoreEvent::Library(_)));

        bus.emit(started(Collection::Feed)).unwrap();
        bus.emit(CoreEvent::Library(LibraryEvent::FavoriteChanged {
            photo_id: "p1".into(),
            favorite: true,
        }))
        .unwrap();

        let event = stream.recv().await.unwrap();
        assert!(matches!(
            event,
            CoreEvent::Library(LibraryEvent::FavoriteChanged { .. })
        ));
    }

    #[tokio::test]
    async fn test_drain_returns_buffered_events() {
        let bus = EventBus::new(8);
        let mut stream = EventStream::new(bus.subscribe());

        bus.emit(started(Collection::Feed)).unwrap();
        bus.emit(started(Collection::Topics)).unwrap();

        assert_eq!(stream.drain().len(), 2);
        assert!(stream.drain().is_empty());
    }

    #[test]
    fn test_severity_and_description() {
        let exhausted = CoreEvent::Sync(SyncEvent::Exhausted {
            collection: Collection::Feed,
            attempts: 4,
            message: "offline".into(),
        });
        assert_eq!(exhausted.severity(), EventSeverity::Error);
        assert_eq!(exhausted.description(), "Remote attempts exhausted");

        let rejected = CoreEvent::Library(LibraryEvent::FavoriteRejected {
            photo_id: "p9".into(),
            limit: 8,
        });
        assert_eq!(rejected.severity(), EventSeverity::Warning);
        assert_eq!(started(Collection::Feed).severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_serialization_shape() {
        let event = CoreEvent::Sync(SyncEvent::LocalHit {
            collection: Collection::TopicPhotos,
            count: 10,
        });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "Sync");
        assert_eq!(json["payload"]["event"], "LocalHit");
        assert_eq!(json["payload"]["collection"], "topic_photos");
        assert_eq!(json["payload"]["count"], 10);
    }
}
