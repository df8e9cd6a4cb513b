//! Unified error handling for the synchronization engine.
//!
//! Per-module errors ([`ApiError`](crate::api::ApiError),
//! [`StoreError`](crate::stash::StoreError)) fold into a single
//! engine-facing [`SyncError`]. No error from this subsystem is fatal to
//! the surrounding application: every failure is local to the attempted
//! operation and recoverable by retrying.

use thiserror::Error;

use hadiya_core::ProductId;

use crate::api::ApiError;
use crate::stash::StoreError;

/// Engine-level error type surfaced to the storefront UI.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A mutation was attempted while no customer is signed in.
    #[error("Sign in to continue")]
    AuthenticationRequired,

    /// The operation referenced a line or favorite the server doesn't have.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The product is already on the favorites list (client-side check).
    #[error("Product {0} is already in favorites")]
    AlreadyFavorite(ProductId),

    /// The server rejected the request as invalid (e.g. quantity below 1).
    #[error("{0}")]
    Validation(String),

    /// The remote service could not be reached or answered abnormally.
    #[error("Shop service error: {0}")]
    Transport(ApiError),

    /// The local cart stash could not be read or written.
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized(_) => Self::AuthenticationRequired,
            ApiError::NotFound(message) => Self::NotFound(message),
            ApiError::Validation(message) => Self::Validation(message),
            other => Self::Transport(other),
        }
    }
}

impl SyncError {
    /// Whether this error came from a missing remote record.
    ///
    /// Used by the absorption policy: deletes treat `NotFound` as an
    /// idempotent no-op rather than a user-visible failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for `SyncError`.
pub type Result<T> = std::result::Result<T, SyncError>;
