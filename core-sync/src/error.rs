use bridge_traits::error::BridgeError;
use bridge_traits::photos::SourceError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decoding(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("No snapshot available for {0}")]
    NotFound(String),

    #[error("Favorite limit of {limit} reached; upgrade to favorite more photos")]
    QuotaExceeded { limit: usize },

    #[error("Topic {topic_id} is limited to {max_pages} pages")]
    PageLimitReached { topic_id: String, max_pages: u32 },

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether the failing remote call is worth repeating.
    ///
    /// Only transport failures and non-2xx responses qualify; everything else
    /// surfaces immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Network(_) | SyncError::ServerError { .. })
    }
}

impl From<SourceError> for SyncError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::InvalidRequest(msg) => SyncError::InvalidRequest(msg),
            SourceError::Network(msg) => SyncError::Network(msg),
            SourceError::Decoding(msg) => SyncError::Decoding(msg),
            SourceError::Unauthorized(msg) => SyncError::Unauthorized(msg),
            SourceError::Server { status, message } => SyncError::ServerError { status, message },
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
