//! Hadiya cart/favorites synchronization engine.
//!
//! This crate keeps a customer's shopping cart and favorites list in sync
//! across the anonymous/authenticated boundary. While anonymous, the cart
//! lives in a device-local stash; on sign-in the stash is merged once into
//! the server-held cart, which becomes the authoritative record. Every
//! mutation after that point is committed remotely before the in-memory
//! view changes.
//!
//! The storefront UI, catalog loading, and checkout are external
//! collaborators: the UI renders from [`cart::CartEngine`] /
//! [`favorites::FavoritesEngine`] views and drives session changes through
//! [`state::Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod favorites;
pub mod notify;
pub mod session;
pub mod stash;
pub mod state;
pub mod telemetry;

pub use cart::{CartEngine, CartPhase};
pub use error::{Result, SyncError};
pub use favorites::FavoritesEngine;
pub use session::{Identity, IdentityTransition, SessionTracker};
pub use state::Storefront;
