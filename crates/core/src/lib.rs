//! Hadiya Core - Shared types library.
//!
//! This crate provides common types used across all Hadiya components:
//! - `sync` - Cart/favorites synchronization engine
//! - `integration-tests` - End-to-end test harness
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, localized display text, cart lines, and favorites

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
