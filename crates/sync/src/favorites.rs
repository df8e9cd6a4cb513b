//! Favorites engine.
//!
//! Structurally the cart engine's simpler sibling: presence/absence per
//! product, no quantities and no merge protocol. Favorites are not
//! collected anonymously, so a sign-in just fetches the authoritative list
//! and a sign-out clears the view.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::instrument;

use hadiya_core::{CustomerId, FavoriteEntry, ProductId, ProductSnapshot};

use crate::api::ApiClient;
use crate::error::{Result, SyncError};
use crate::notify::SharedSink;
use crate::session::{Identity, IdentityTransition};

#[derive(Debug)]
struct FavoritesState {
    /// Signed-in customer, if any.
    customer: Option<CustomerId>,
    entries: Vec<FavoriteEntry>,
    /// Bumped on every identity transition; stale responses are discarded.
    epoch: u64,
    /// Customer whose list has been fetched for the current sign-in.
    loaded_for: Option<CustomerId>,
}

/// The favorites engine. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct FavoritesEngine {
    inner: Arc<FavoritesEngineInner>,
}

struct FavoritesEngineInner {
    api: ApiClient,
    sink: SharedSink,
    state: Mutex<FavoritesState>,
}

impl FavoritesEngine {
    /// Create an engine with an empty view and no signed-in customer.
    #[must_use]
    pub fn new(api: ApiClient, sink: SharedSink) -> Self {
        Self {
            inner: Arc::new(FavoritesEngineInner {
                api,
                sink,
                state: Mutex::new(FavoritesState {
                    customer: None,
                    entries: Vec::new(),
                    epoch: 0,
                    loaded_for: None,
                }),
            }),
        }
    }

    // =========================================================================
    // Session transitions
    // =========================================================================

    /// React to an identity transition reported by the session layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the authoritative list could not be fetched; a
    /// repeated call retries the fetch.
    #[instrument(skip(self), fields(next = ?transition.next))]
    pub async fn resync(&self, transition: &IdentityTransition) -> Result<()> {
        match transition.next {
            Identity::Customer(customer) => self.resync_authenticated(customer).await,
            Identity::Anonymous => {
                let mut state = self.inner.state.lock().await;
                state.epoch += 1;
                state.customer = None;
                state.loaded_for = None;
                state.entries.clear();
                Ok(())
            }
        }
    }

    /// Fetch the authoritative list for a newly authenticated customer.
    async fn resync_authenticated(&self, customer: CustomerId) -> Result<()> {
        let epoch = {
            let mut state = self.inner.state.lock().await;
            if state.loaded_for == Some(customer) {
                tracing::debug!(%customer, "favorites already loaded, ignoring duplicate transition");
                return Ok(());
            }
            state.epoch += 1;
            state.customer = Some(customer);
            state.loaded_for = None;
            state.entries.clear();
            state.epoch
        };

        match self.inner.api.fetch_favorites().await {
            Ok(envelope) => {
                let mut state = self.inner.state.lock().await;
                if state.epoch == epoch {
                    state.entries = envelope.favorites;
                    state.loaded_for = Some(customer);
                } else {
                    tracing::debug!(%customer, "discarding favorites for a superseded identity");
                }
                Ok(())
            }
            Err(e) => {
                let err = SyncError::from(e);
                let stale = self.inner.state.lock().await.epoch != epoch;
                if stale {
                    tracing::debug!(%customer, "ignoring favorites failure for a superseded identity");
                    return Ok(());
                }
                self.inner.sink.failure(&err.to_string());
                Err(err)
            }
        }
    }

    // =========================================================================
    // Mutations (commit-on-confirmation)
    // =========================================================================

    /// Add a product to the favorites list.
    ///
    /// Checked client-side first to save the round trip; if a concurrent
    /// request won the race anyway, the server's `Duplicate` answer is
    /// absorbed as a benign no-op, never shown to the user.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` while not signed in, `AlreadyFavorite` if
    /// the product is on the list, or the remote failure.
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn add(&self, product: &ProductSnapshot) -> Result<()> {
        let epoch = {
            let state = self.inner.state.lock().await;
            if state.customer.is_none() {
                drop(state);
                return Err(self.report(SyncError::AuthenticationRequired));
            }
            if state
                .entries
                .iter()
                .any(|entry| entry.product_id == product.product_id)
            {
                return Err(SyncError::AlreadyFavorite(product.product_id));
            }
            state.epoch
        };

        match self.inner.api.add_favorite(product).await {
            Ok(envelope) => {
                if self.insert_entry(envelope.favorite, epoch).await {
                    self.inner.sink.success(&envelope.message);
                }
                Ok(())
            }
            Err(e) if e.is_duplicate() => {
                // Lost the race between the client-side check and the server
                // write: the entry exists remotely, so converge the view.
                self.insert_entry(FavoriteEntry::new(product.clone()), epoch)
                    .await;
                Ok(())
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Remove a product from the favorites list. Idempotent: a product the
    /// server doesn't have is treated as already removed.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` while not signed in, or the remote failure.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> Result<()> {
        let epoch = self.require_authenticated().await?;

        match self.inner.api.remove_favorite(product_id).await {
            Ok(envelope) => {
                if self.splice_entry(product_id, epoch).await {
                    self.inner.sink.success(&envelope.message);
                }
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                self.splice_entry(product_id, epoch).await;
                Ok(())
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Remove every favorite. The view empties only after confirmation.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` while not signed in, or the remote failure.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<()> {
        let epoch = self.require_authenticated().await?;

        match self.inner.api.clear_favorites().await {
            Ok(envelope) => {
                let mut state = self.inner.state.lock().await;
                if state.epoch == epoch {
                    state.entries.clear();
                    drop(state);
                    self.inner.sink.success(&envelope.message);
                } else {
                    tracing::debug!("discarding stale favorites clear");
                }
                Ok(())
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Whether a product is on the in-memory list.
    pub async fn is_favorite(&self, product_id: ProductId) -> bool {
        self.inner
            .state
            .lock()
            .await
            .entries
            .iter()
            .any(|entry| entry.product_id == product_id)
    }

    /// Snapshot of the current entries.
    pub async fn entries(&self) -> Vec<FavoriteEntry> {
        self.inner.state.lock().await.entries.clone()
    }

    /// Number of entries in the view.
    pub async fn count(&self) -> usize {
        self.inner.state.lock().await.entries.len()
    }

    /// Ask the server whether a product is favorited.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` while not signed in, or the remote failure.
    pub async fn remote_contains(&self, product_id: ProductId) -> Result<bool> {
        self.require_authenticated().await?;
        let envelope = self.inner.api.favorite_contains(product_id).await?;
        Ok(envelope.favorite)
    }

    /// Ask the server for the favorites count.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` while not signed in, or the remote failure.
    pub async fn remote_count(&self) -> Result<u64> {
        self.require_authenticated().await?;
        let envelope = self.inner.api.favorites_count().await?;
        Ok(envelope.count)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn require_authenticated(&self) -> Result<u64> {
        let state = self.inner.state.lock().await;
        if state.customer.is_some() {
            Ok(state.epoch)
        } else {
            drop(state);
            Err(self.report(SyncError::AuthenticationRequired))
        }
    }

    /// Insert an entry unless it is already present or the epoch is stale.
    /// Returns whether the response was applied.
    async fn insert_entry(&self, entry: FavoriteEntry, epoch: u64) -> bool {
        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!("discarding stale favorite insert");
            return false;
        }
        if state
            .entries
            .iter()
            .all(|existing| existing.product_id != entry.product_id)
        {
            state.entries.push(entry);
        }
        true
    }

    /// Drop an entry from the view if the epoch still matches. Returns
    /// whether the response was applied.
    async fn splice_entry(&self, product_id: ProductId, epoch: u64) -> bool {
        let mut state = self.inner.state.lock().await;
        if state.epoch == epoch {
            state.entries.retain(|entry| entry.product_id != product_id);
            true
        } else {
            tracing::debug!("discarding stale favorite removal");
            false
        }
    }

    fn report(&self, err: SyncError) -> SyncError {
        self.inner.sink.failure(&err.to_string());
        err
    }
}
