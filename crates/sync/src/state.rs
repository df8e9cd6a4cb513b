//! Storefront-facing composition of the synchronization engines.
//!
//! The host application builds one [`Storefront`] and drives session
//! changes through it; the UI renders from the engine views it exposes.
//! There are no broadcast events: each identity change is applied to the
//! tracker and, when it is a real change by value, handed directly to both
//! engines' resync functions.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::instrument;

use hadiya_core::CustomerId;

use crate::api::ApiClient;
use crate::cart::CartEngine;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::favorites::FavoritesEngine;
use crate::notify::{SharedSink, TracingSink};
use crate::session::{Identity, IdentityTransition, SessionTracker};
use crate::stash::CartStash;

/// Application state tying the engines, the API client, and the session
/// tracker together. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: SyncConfig,
    api: ApiClient,
    stash: CartStash,
    cart: CartEngine,
    favorites: FavoritesEngine,
    tracker: Mutex<SessionTracker>,
}

impl Storefront {
    /// Build the storefront state with the default (tracing) notification
    /// sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: SyncConfig) -> Result<Self> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Build the storefront state with the host UI's notification sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_sink(config: SyncConfig, sink: SharedSink) -> Result<Self> {
        let api = ApiClient::new(&config).map_err(crate::error::SyncError::Transport)?;
        let stash = CartStash::new(config.stash_path.clone());
        let cart = CartEngine::new(api.clone(), stash.clone(), Arc::clone(&sink));
        let favorites = FavoritesEngine::new(api.clone(), sink);

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                stash,
                cart,
                favorites,
                tracker: Mutex::new(SessionTracker::new()),
            }),
        })
    }

    /// Load the stashed anonymous cart into the view at application start.
    ///
    /// # Errors
    ///
    /// Returns an error if the stash slot is unreadable.
    pub async fn bootstrap(&self) -> Result<()> {
        self.inner.cart.bootstrap().await
    }

    /// Apply a successful sign-in (or account swap) reported by the auth
    /// layer.
    ///
    /// The bearer credential is refreshed on every call; the engines resync
    /// once per identity change by value, so re-reporting the same customer
    /// re-runs nothing unless an earlier resync failed, in which case it is
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns the first resync error; both engines are always driven.
    #[instrument(skip(self, bearer))]
    pub async fn sign_in(&self, customer_id: CustomerId, bearer: SecretString) -> Result<()> {
        let next = Identity::Customer(customer_id);
        let transition = {
            let mut tracker = self.inner.tracker.lock().await;
            tracker.apply(next).unwrap_or(IdentityTransition {
                previous: next,
                next,
            })
        };

        // The auth layer may rotate tokens without an identity change.
        self.inner.api.set_bearer(bearer).await;

        let cart_result = self.inner.cart.resync(&transition).await;
        let favorites_result = self.inner.favorites.resync(&transition).await;
        cart_result.and(favorites_result)
    }

    /// Apply a sign-out. The authenticated views are discarded (the server
    /// keeps the customer's records) and the cart view reverts to the stash.
    ///
    /// # Errors
    ///
    /// Returns an error if the stash slot is unreadable.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        let transition = {
            let mut tracker = self.inner.tracker.lock().await;
            tracker.apply(Identity::Anonymous)
        };

        self.inner.api.clear_bearer().await;

        match transition {
            Some(transition) => {
                let cart_result = self.inner.cart.resync(&transition).await;
                let favorites_result = self.inner.favorites.resync(&transition).await;
                cart_result.and(favorites_result)
            }
            None => Ok(()),
        }
    }

    /// The currently active identity.
    pub async fn identity(&self) -> Identity {
        self.inner.tracker.lock().await.current()
    }

    /// The cart engine view.
    #[must_use]
    pub fn cart(&self) -> &CartEngine {
        &self.inner.cart
    }

    /// The favorites engine view.
    #[must_use]
    pub fn favorites(&self) -> &FavoritesEngine {
        &self.inner.favorites
    }

    /// The anonymous cart stash. The guest checkout flow writes it; the
    /// engine only reads it and clears it at merge completion.
    #[must_use]
    pub fn stash(&self) -> &CartStash {
        &self.inner.stash
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }
}
