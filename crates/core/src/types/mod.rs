//! Core types for Hadiya.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod product;
pub mod text;

pub use id::*;
pub use product::{CartLine, CartTotals, FavoriteEntry, ProductSnapshot};
pub use text::LocalizedText;
