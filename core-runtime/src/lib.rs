//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the photo-sync core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its configuration types,
//! logging conventions and the broadcast channel that sync and favorite
//! changes are published on.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
