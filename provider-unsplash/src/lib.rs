//! # Unsplash Provider
//!
//! Implements the `PhotoSource` trait for the Unsplash REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - Random photo batches (`GET /photos/random`)
//! - The topic list (`GET /topics`)
//! - Paged topic photos (`GET /topics/{id}/photos`)
//! - Mapping of HTTP and decoding failures onto `SourceError`
//!
//! Requests go through the host's `HttpClient` and are authenticated with a
//! `Client-ID` access key. Each call is a single attempt; the sync engine owns
//! the retry policy.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::UnsplashConnector;
pub use error::{Result, UnsplashError};
