//! Remote Source Contract
//!
//! The three read-only capabilities the sync core needs from a photo
//! service: a batch of random photos, a page of topics, and a page of photos
//! belonging to one topic. Records returned here are wire-neutral; the core
//! turns them into stored entities.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size variants of a single image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUrls {
    pub raw: String,
    pub full: String,
    pub regular: String,
    pub small: String,
    pub thumb: String,
}

/// Author of a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUser {
    pub id: String,
    /// Display name
    pub name: String,
    /// Handle
    pub username: String,
    pub bio: Option<String>,
    pub portfolio_url: Option<String>,
}

/// A photo as returned by the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePhoto {
    pub id: String,
    pub urls: PhotoUrls,
    pub user: PhotoUser,
}

/// A topic as returned by the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTopic {
    pub id: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Categorized remote source failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decoding(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },
}

impl SourceError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Network(_) | SourceError::Server { .. })
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Remote photo service.
///
/// All calls are idempotent reads. Implementations make a single attempt per
/// call; retry policy belongs to the caller.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Fetch `count` random photos.
    async fn fetch_random_photos(&self, count: u32) -> SourceResult<Vec<RemotePhoto>>;

    /// Fetch the first page of topics, `per_page` entries long.
    async fn fetch_topics(&self, per_page: u32) -> SourceResult<Vec<RemoteTopic>>;

    /// Fetch one page of photos for a topic. Pages are 1-based.
    async fn fetch_topic_photos(
        &self,
        topic_id: &str,
        page: u32,
        per_page: u32,
    ) -> SourceResult<Vec<RemotePhoto>>;
}
