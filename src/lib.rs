//! Workspace placeholder crate.
//!
//! Exposes the shared feature flags that map onto the individual workspace
//! crates. Host applications can depend on `firstlook-workspace` and enable
//! `desktop-shims` instead of wiring `core-service` and the desktop bridges
//! by hand.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
