//! # Photo Library Module
//!
//! Owns the Local Store: the SQLite database that holds feed photos, topics
//! and topic photos between runs.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema and migrations
//! - Domain models, including the [`Photo`](models::Photo) tagged union
//! - Repository traits with filtered, sorted, limited fetches
//! - Upsert semantics: writing an existing id updates it in place

pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{FeedPhoto, Photo, PhotoRecord, Topic, TopicPhoto};
pub use query::{RecordFilter, RecordSort};
pub use repositories::PhotoLibrary;
