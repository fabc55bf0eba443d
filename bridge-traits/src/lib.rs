//! # Host Bridge Traits
//!
//! Capability contracts between the photo-sync core and the host it runs in.
//!
//! ## Overview
//!
//! The core never talks to the network or the disk directly. Each capability it
//! needs is described here as a trait, and the host (or `bridge-desktop` on
//! desktop targets) supplies a concrete adapter.
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Async HTTP request execution
//! - [`FileSystemAccess`](storage::FileSystemAccess) - File I/O for snapshots and caches
//!
//! ### Remote Source
//! - [`PhotoSource`](photos::PhotoSource) - Random photos, topics, and topic photo pages
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! Host capabilities fail with [`BridgeError`](error::BridgeError); the
//! Remote Source fails with [`SourceError`](photos::SourceError), whose
//! categories tell the sync engine what is worth retrying. Every trait is
//! `Send + Sync` so adapters can sit behind an `Arc`.

pub mod error;
pub mod http;
pub mod photos;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use photos::{PhotoSource, PhotoUrls, PhotoUser, RemotePhoto, RemoteTopic, SourceError};
pub use storage::{FileMetadata, FileSystemAccess};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
