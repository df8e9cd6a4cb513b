//! Device-local cart stash.
//!
//! A single named slot holding the serialized lines of the anonymous cart.
//! Absence of the slot is equivalent to an empty cart, not an error.
//!
//! Ownership contract: the slot is read and written only while the session
//! is anonymous, and cleared exactly once when the merge protocol adopts
//! its contents into the server cart. The engine never writes it while
//! authenticated, so the anonymous snapshot cannot silently reappear after
//! logout.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::instrument;

use hadiya_core::CartLine;

/// Errors that can occur reading or writing the stash slot.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Slot contents could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// File-backed slot for the anonymous cart.
#[derive(Debug, Clone)]
pub struct CartStash {
    path: PathBuf,
}

impl CartStash {
    /// Create a stash over the given slot path. The file is not touched
    /// until the first read or write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the stashed lines. A missing slot yields an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the slot exists but cannot be read or parsed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<CartLine>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the slot with the given lines.
    ///
    /// Called only while the session is anonymous.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the slot cannot be written.
    #[instrument(skip(self, lines), fields(path = %self.path.display(), line_count = lines.len()))]
    pub async fn save(&self, lines: &[CartLine]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(lines)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    /// Remove the slot. Removing an already-absent slot is Ok.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the slot exists but cannot be removed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
