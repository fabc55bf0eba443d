//! Error types for the Unsplash provider

use bridge_traits::error::BridgeError;
use bridge_traits::photos::SourceError;
use thiserror::Error;

/// Unsplash provider errors
#[derive(Error, Debug)]
pub enum UnsplashError {
    /// The access key was rejected
    #[error("Unsplash rejected the access key (status {status_code}): {message}")]
    Unauthorized { status_code: u16, message: String },

    /// API request returned a non-success status
    #[error("Unsplash API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The request could not be built (bad URL or parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Unsplash operations
pub type Result<T> = std::result::Result<T, UnsplashError>;

impl UnsplashError {
    /// Classifies a non-2xx response.
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => UnsplashError::Unauthorized {
                status_code,
                message,
            },
            _ => UnsplashError::ApiError {
                status_code,
                message,
            },
        }
    }
}

impl From<UnsplashError> for SourceError {
    fn from(error: UnsplashError) -> Self {
        match error {
            UnsplashError::Unauthorized { message, .. } => SourceError::Unauthorized(message),
            UnsplashError::ApiError {
                status_code,
                message,
            } => SourceError::Server {
                status: status_code,
                message,
            },
            UnsplashError::ParseError(msg) => SourceError::Decoding(msg),
            UnsplashError::InvalidRequest(msg) => SourceError::InvalidRequest(msg),
            UnsplashError::BridgeError(BridgeError::OperationFailed(msg)) => {
                SourceError::InvalidRequest(msg)
            }
            UnsplashError::BridgeError(e) => SourceError::Network(e.to_string()),
        }
    }
}
