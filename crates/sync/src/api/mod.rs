//! HTTP client for the Hadiya shop API.
//!
//! The remote service owns the durable, per-customer cart and favorites
//! records and computes authoritative totals. This client speaks JSON
//! envelopes over an encrypted transport and attaches the bearer credential
//! issued by the auth layer; it does not refresh or mint tokens.
//!
//! Status codes map to typed errors in one place ([`ApiError::from_status`])
//! so the engines can apply their absorption policy (`NotFound` on delete is
//! a no-op, favorite `Duplicate` is benign) without inspecting raw responses.

pub mod types;

use std::sync::Arc;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

use hadiya_core::{CartLine, ProductId, ProductSnapshot};

use crate::config::SyncConfig;
use types::{
    AckEnvelope, AddFavoriteRequest, AddLineRequest, CartEnvelope, CountEnvelope, ErrorBody,
    FavoriteEnvelope, FavoritesEnvelope, MergeRequest, PresenceEnvelope, TotalsEnvelope,
    UpdateLineRequest,
};

/// Errors that can occur when calling the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (network, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Credential missing, expired, or rejected (401/403).
    #[error("{0}")]
    Unauthorized(String),

    /// Referenced record does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness constraint collision (409).
    #[error("{0}")]
    Duplicate(String),

    /// Request rejected as invalid (400/422).
    #[error("{0}")]
    Validation(String),

    /// Any other non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl ApiError {
    /// Map a non-success status and its message to a typed error.
    fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            409 => Self::Duplicate(message),
            400 | 422 => Self::Validation(message),
            _ => Self::Api { status, message },
        }
    }

    /// Whether this is a uniqueness collision (favorite added twice).
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }

    /// Whether the referenced record was missing remotely.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Hadiya shop API.
///
/// Cheaply cloneable via `Arc`. The bearer credential is swapped on
/// sign-in/sign-out by the session layer; requests sent without a
/// credential are rejected by the server with 401.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    bearer: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("bearer", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new shop API client.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client fails to build.
    pub fn new(config: &SyncConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                bearer: RwLock::new(None),
            }),
        })
    }

    /// Install the bearer credential for the signed-in customer.
    pub async fn set_bearer(&self, token: SecretString) {
        *self.inner.bearer.write().await = Some(token);
    }

    /// Drop the bearer credential on sign-out.
    pub async fn clear_bearer(&self) {
        *self.inner.bearer.write().await = None;
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Send a request without a body.
    async fn send<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, ApiError> {
        let request = self.inner.client.request(method, self.endpoint(path));
        self.dispatch(request).await
    }

    /// Send a request with a JSON body.
    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self
            .inner
            .client
            .request(method, self.endpoint(path))
            .json(body);
        self.dispatch(request).await
    }

    /// Attach the credential, send, and decode the envelope.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let request = {
            let bearer = self.inner.bearer.read().await;
            match bearer.as_ref() {
                Some(token) => request.bearer_auth(token.expose_secret()),
                None => request,
            }
        };

        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::from_status(
                status.as_u16(),
                error_message(status, &text),
            ));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse shop API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Cart Endpoints
    // =========================================================================

    /// Fetch the authoritative cart for the current customer.
    ///
    /// The server creates an empty cart record on first access, so this
    /// never fails with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credential is rejected.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<CartEnvelope, ApiError> {
        self.send(Method::GET, "cart").await
    }

    /// Add units of a product to the cart. The server merges by summing
    /// into an existing line with the same product ID.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `quantity < 1`, or an error if the request fails.
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn add_cart_line(
        &self,
        product: &ProductSnapshot,
        quantity: u32,
    ) -> Result<TotalsEnvelope, ApiError> {
        let body = AddLineRequest {
            product: product.clone(),
            quantity,
        };
        self.send_json(Method::POST, "cart/lines", &body).await
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product is not in the cart, or `Validation`
    /// if `quantity < 1`.
    #[instrument(skip(self))]
    pub async fn update_cart_line(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<TotalsEnvelope, ApiError> {
        let body = UpdateLineRequest { quantity };
        self.send_json(Method::PATCH, &format!("cart/lines/{product_id}"), &body)
            .await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product is not in the cart.
    #[instrument(skip(self))]
    pub async fn remove_cart_line(&self, product_id: ProductId) -> Result<TotalsEnvelope, ApiError> {
        self.send(Method::DELETE, &format!("cart/lines/{product_id}"))
            .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<AckEnvelope, ApiError> {
        self.send(Method::DELETE, "cart").await
    }

    /// Merge device-local lines into the server cart, summing quantities by
    /// product ID, and return the resulting authoritative cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn merge_cart(&self, lines: &[CartLine]) -> Result<CartEnvelope, ApiError> {
        let body = MergeRequest {
            lines: lines.to_vec(),
        };
        self.send_json(Method::POST, "cart/merge", &body).await
    }

    // =========================================================================
    // Favorites Endpoints
    // =========================================================================

    /// Fetch the customer's favorites list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn fetch_favorites(&self) -> Result<FavoritesEnvelope, ApiError> {
        self.send(Method::GET, "favorites").await
    }

    /// Add a product to favorites.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the `(customer, product)` pair already exists.
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn add_favorite(
        &self,
        product: &ProductSnapshot,
    ) -> Result<FavoriteEnvelope, ApiError> {
        let body = AddFavoriteRequest {
            product: product.clone(),
        };
        self.send_json(Method::POST, "favorites", &body).await
    }

    /// Remove a product from favorites.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product is not on the list.
    #[instrument(skip(self))]
    pub async fn remove_favorite(&self, product_id: ProductId) -> Result<AckEnvelope, ApiError> {
        self.send(Method::DELETE, &format!("favorites/{product_id}"))
            .await
    }

    /// Remove every favorite for the customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_favorites(&self) -> Result<AckEnvelope, ApiError> {
        self.send(Method::DELETE, "favorites").await
    }

    /// Check whether a single product is favorited.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn favorite_contains(&self, product_id: ProductId) -> Result<PresenceEnvelope, ApiError> {
        self.send(Method::GET, &format!("favorites/{product_id}"))
            .await
    }

    /// Count the customer's favorites.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn favorites_count(&self) -> Result<CountEnvelope, ApiError> {
        self.send(Method::GET, "favorites/count").await
    }
}

/// Pull the human-readable message out of an error body.
///
/// Falls back to the raw text, then to the status reason, so the
/// notification sink always has something to show.
fn error_message(status: reqwest::StatusCode, text: &str) -> String {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(text) {
        return body.message;
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
