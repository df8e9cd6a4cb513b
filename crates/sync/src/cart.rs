//! Cart synchronization engine.
//!
//! Owns the in-memory cart view the storefront UI renders from, and keeps
//! it aligned with whichever record is authoritative for the current
//! session: the device-local stash while anonymous, the server cart once a
//! customer signs in.
//!
//! # Phases
//!
//! - `Anonymous` - view sourced from the stash; mutations are rejected.
//! - `Loading` - transient, while a sign-in resync is running.
//! - `Authenticated` - view is a cache of the server record; every mutation
//!   commits remotely first and touches the view only after confirmation.
//!
//! # Concurrency
//!
//! Overlapping UI calls are not serialized against each other. Each
//! operation captures the state epoch before awaiting the network and
//! applies its response against the *latest* line list under the lock, so
//! two in-flight adds for different products each merge without clobbering
//! the other. The epoch is bumped on every identity change; a response that
//! arrives after a logout or account swap no longer matches and is
//! discarded instead of resurrecting stale state.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::instrument;

use hadiya_core::{CartLine, CartTotals, CustomerId, ProductId, ProductSnapshot};

use crate::api::ApiClient;
use crate::error::{Result, SyncError};
use crate::notify::SharedSink;
use crate::session::{Identity, IdentityTransition};
use crate::stash::CartStash;

/// Where the cart view is currently sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartPhase {
    /// No customer signed in; the view mirrors the stash.
    Anonymous,
    /// A sign-in resync is in progress.
    Loading,
    /// The view caches this customer's server cart.
    Authenticated(CustomerId),
}

/// One-shot guard making the merge protocol at-most-once per identity.
///
/// Running the merge twice would double-sum the stashed quantities into the
/// server cart.
#[derive(Debug, Default)]
struct MergeGuard {
    /// Customer and epoch of a merge currently in flight.
    in_flight: Option<(CustomerId, u64)>,
    /// Customer whose merge has completed for the current sign-in.
    done_for: Option<CustomerId>,
}

#[derive(Debug)]
struct CartState {
    phase: CartPhase,
    lines: Vec<CartLine>,
    /// Bumped on every real identity transition; responses carrying an
    /// older epoch are stale and must not be applied.
    epoch: u64,
    merge: MergeGuard,
}

/// The cart synchronization engine. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct CartEngine {
    inner: Arc<CartEngineInner>,
}

struct CartEngineInner {
    api: ApiClient,
    stash: CartStash,
    sink: SharedSink,
    state: Mutex<CartState>,
}

impl CartEngine {
    /// Create an engine starting in the `Anonymous` phase with an empty
    /// view. Call [`Self::bootstrap`] to populate the view from the stash.
    #[must_use]
    pub fn new(api: ApiClient, stash: CartStash, sink: SharedSink) -> Self {
        Self {
            inner: Arc::new(CartEngineInner {
                api,
                stash,
                sink,
                state: Mutex::new(CartState {
                    phase: CartPhase::Anonymous,
                    lines: Vec::new(),
                    epoch: 0,
                    merge: MergeGuard::default(),
                }),
            }),
        }
    }

    /// Load the stashed anonymous cart into the view at application start.
    ///
    /// Does nothing if a session resync has already moved the engine out of
    /// the `Anonymous` phase.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the stash slot is unreadable.
    pub async fn bootstrap(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.phase == CartPhase::Anonymous {
            state.lines = self.inner.stash.load().await?;
        }
        Ok(())
    }

    // =========================================================================
    // Session transitions
    // =========================================================================

    /// React to an identity transition reported by the session layer.
    ///
    /// Safe to call repeatedly with the same target identity: the merge
    /// protocol runs at most once per sign-in, and a repeated call after a
    /// failed resync retries it.
    ///
    /// # Errors
    ///
    /// Returns an error if the resync could not complete; the engine stays
    /// in `Loading` and the call can be retried.
    #[instrument(skip(self), fields(next = ?transition.next))]
    pub async fn resync(&self, transition: &IdentityTransition) -> Result<()> {
        match transition.next {
            Identity::Customer(customer) => self.resync_authenticated(customer).await,
            Identity::Anonymous => self.resync_anonymous().await,
        }
    }

    /// Run the merge protocol for a newly authenticated customer.
    async fn resync_authenticated(&self, customer: CustomerId) -> Result<()> {
        let epoch = {
            let mut state = self.inner.state.lock().await;
            if state.merge.done_for == Some(customer) {
                tracing::debug!(%customer, "merge already completed, ignoring duplicate transition");
                return Ok(());
            }
            if let Some((running, _)) = state.merge.in_flight
                && running == customer
            {
                tracing::debug!(%customer, "merge already in flight, ignoring duplicate transition");
                return Ok(());
            }

            // A real transition: fresh sign-in or account swap. Cached state
            // for any previous identity is invalid from here on.
            state.epoch += 1;
            state.phase = CartPhase::Loading;
            state.lines.clear();
            state.merge.done_for = None;
            state.merge.in_flight = Some((customer, state.epoch));
            state.epoch
        };

        let outcome = self.run_merge().await;

        let mut state = self.inner.state.lock().await;
        let current = state.epoch == epoch;
        if current {
            state.merge.in_flight = None;
        }
        match outcome {
            Ok((lines, message)) => {
                if current {
                    state.merge.done_for = Some(customer);
                    state.phase = CartPhase::Authenticated(customer);
                    state.lines = lines;
                    drop(state);
                    self.inner.sink.success(&message);
                } else {
                    tracing::debug!(%customer, "discarding merge result for a superseded identity");
                }
                Ok(())
            }
            Err(e) => {
                if current {
                    drop(state);
                    self.inner.sink.failure(&e.to_string());
                    Err(e)
                } else {
                    tracing::debug!(%customer, "ignoring merge failure for a superseded identity");
                    Ok(())
                }
            }
        }
    }

    /// The merge protocol body: reconcile the stash with the server cart
    /// and return the authoritative lines plus the server message.
    async fn run_merge(&self) -> Result<(Vec<CartLine>, String)> {
        let stashed = self.inner.stash.load().await?;

        let envelope = if stashed.is_empty() {
            self.inner.api.fetch_cart().await?
        } else {
            let merged = self.inner.api.merge_cart(&stashed).await?;
            // The anonymous snapshot is now part of the server cart; keeping
            // it would double-count on a future merge.
            self.inner.stash.clear().await?;
            merged
        };

        Ok((envelope.cart.lines, envelope.message))
    }

    /// Discard the authenticated view on logout and re-read the stash.
    async fn resync_anonymous(&self) -> Result<()> {
        let epoch = {
            let mut state = self.inner.state.lock().await;
            state.epoch += 1;
            state.phase = CartPhase::Anonymous;
            // The server keeps the customer's cart; nothing is persisted here.
            state.lines.clear();
            state.merge = MergeGuard::default();
            state.epoch
        };

        let stashed = self.inner.stash.load().await?;
        let mut state = self.inner.state.lock().await;
        if state.epoch == epoch {
            state.lines = stashed;
        }
        Ok(())
    }

    // =========================================================================
    // Mutations (commit-on-confirmation)
    // =========================================================================

    /// Add units of a product to the cart.
    ///
    /// On success the view is updated by the merge-by-sum rule: an existing
    /// line's quantity grows, otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` while not signed in, `Validation` for a zero
    /// quantity, or the remote failure; the view is untouched on any error.
    #[instrument(skip(self, product), fields(product_id = %product.product_id, quantity))]
    pub async fn add_line(&self, product: &ProductSnapshot, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(self.report(SyncError::Validation(
                "quantity must be at least 1".to_string(),
            )));
        }
        let epoch = self.require_authenticated().await?;

        match self.inner.api.add_cart_line(product, quantity).await {
            Ok(envelope) => {
                let mut state = self.inner.state.lock().await;
                if state.epoch == epoch {
                    merge_line(&mut state.lines, product, quantity);
                    drop(state);
                    self.inner.sink.success(&envelope.message);
                } else {
                    tracing::debug!("discarding stale add-line response");
                }
                Ok(())
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Overwrite a line's quantity. A quantity of zero removes the line;
    /// zero is never stored.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` while not signed in, `NotFound` if the
    /// product is not in the server cart, or the remote failure.
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return self.remove_line(product_id).await;
        }
        let epoch = self.require_authenticated().await?;

        match self.inner.api.update_cart_line(product_id, quantity).await {
            Ok(envelope) => {
                let mut state = self.inner.state.lock().await;
                if state.epoch == epoch {
                    if let Some(line) = state
                        .lines
                        .iter_mut()
                        .find(|line| line.product_id == product_id)
                    {
                        line.quantity = quantity;
                    }
                    drop(state);
                    self.inner.sink.success(&envelope.message);
                } else {
                    tracing::debug!("discarding stale quantity update");
                }
                Ok(())
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Remove a line from the cart.
    ///
    /// Removal is idempotent: a line the server doesn't have is treated as
    /// already removed, not surfaced as a failure.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` while not signed in, or the remote failure.
    #[instrument(skip(self))]
    pub async fn remove_line(&self, product_id: ProductId) -> Result<()> {
        let epoch = self.require_authenticated().await?;

        match self.inner.api.remove_cart_line(product_id).await {
            Ok(envelope) => {
                if self.splice_line(product_id, epoch).await {
                    self.inner.sink.success(&envelope.message);
                }
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                // Absorbed: the record is already gone remotely; drop any
                // local copy so the views converge.
                self.splice_line(product_id, epoch).await;
                Ok(())
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Empty the cart. The view empties only after remote confirmation.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` while not signed in, or the remote failure.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let epoch = self.require_authenticated().await?;

        match self.inner.api.clear_cart().await {
            Ok(envelope) => {
                let mut state = self.inner.state.lock().await;
                if state.epoch == epoch {
                    state.lines.clear();
                    drop(state);
                    self.inner.sink.success(&envelope.message);
                } else {
                    tracing::debug!("discarding stale clear response");
                }
                Ok(())
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Re-fetch the authoritative cart into the view.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` while not signed in, or the remote failure.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let epoch = self.require_authenticated().await?;

        let envelope = self.inner.api.fetch_cart().await?;
        let mut state = self.inner.state.lock().await;
        if state.epoch == epoch {
            state.lines = envelope.cart.lines;
        }
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the current lines, in display order.
    pub async fn lines(&self) -> Vec<CartLine> {
        self.inner.state.lock().await.lines.clone()
    }

    /// Aggregate figures, recomputed from the current line set.
    pub async fn totals(&self) -> CartTotals {
        CartTotals::of(&self.inner.state.lock().await.lines)
    }

    /// The engine's current phase.
    pub async fn phase(&self) -> CartPhase {
        self.inner.state.lock().await.phase
    }

    /// Look up a single line.
    pub async fn find_line(&self, product_id: ProductId) -> Option<CartLine> {
        self.inner
            .state
            .lock()
            .await
            .lines
            .iter()
            .find(|line| line.product_id == product_id)
            .cloned()
    }

    /// Whether the view has no lines.
    pub async fn is_empty(&self) -> bool {
        self.inner.state.lock().await.lines.is_empty()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Current epoch if a customer is signed in, else the rejection the
    /// mutation contract requires.
    async fn require_authenticated(&self) -> Result<u64> {
        let state = self.inner.state.lock().await;
        match state.phase {
            CartPhase::Authenticated(_) => Ok(state.epoch),
            CartPhase::Anonymous | CartPhase::Loading => {
                drop(state);
                Err(self.report(SyncError::AuthenticationRequired))
            }
        }
    }

    /// Drop a line from the view if the epoch still matches. Returns
    /// whether the response was applied.
    async fn splice_line(&self, product_id: ProductId, epoch: u64) -> bool {
        let mut state = self.inner.state.lock().await;
        if state.epoch == epoch {
            state.lines.retain(|line| line.product_id != product_id);
            true
        } else {
            tracing::debug!("discarding stale line removal");
            false
        }
    }

    /// Surface a failure through the sink and hand the error back.
    fn report(&self, err: SyncError) -> SyncError {
        self.inner.sink.failure(&err.to_string());
        err
    }
}

/// Merge-by-sum: grow an existing line or append a new one.
fn merge_line(lines: &mut Vec<CartLine>, product: &ProductSnapshot, quantity: u32) {
    match lines
        .iter_mut()
        .find(|line| line.product_id == product.product_id)
    {
        Some(line) => line.quantity += quantity,
        None => lines.push(CartLine::new(product.clone(), quantity)),
    }
}
