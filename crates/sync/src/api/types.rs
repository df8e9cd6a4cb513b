//! Wire types for the Hadiya shop API.
//!
//! Every response body is an envelope carrying a human-readable `message`
//! alongside the payload; the engines hand that message verbatim to the
//! notification sink. Error bodies are `{ "message": ... }`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hadiya_core::{CartLine, FavoriteEntry, ProductSnapshot};

// =============================================================================
// Requests
// =============================================================================

/// Body for `POST /cart/lines`.
#[derive(Debug, Serialize)]
pub struct AddLineRequest {
    /// Product display fields captured into the line.
    pub product: ProductSnapshot,
    /// Units to add. The server rejects values below 1.
    pub quantity: u32,
}

/// Body for `PATCH /cart/lines/{product_id}`.
#[derive(Debug, Serialize)]
pub struct UpdateLineRequest {
    /// New absolute quantity. The server rejects values below 1.
    pub quantity: u32,
}

/// Body for `POST /cart/merge`: the device-local lines collected while
/// the customer was anonymous.
#[derive(Debug, Serialize)]
pub struct MergeRequest {
    pub lines: Vec<CartLine>,
}

/// Body for `POST /favorites`.
#[derive(Debug, Serialize)]
pub struct AddFavoriteRequest {
    pub product: ProductSnapshot,
}

// =============================================================================
// Responses
// =============================================================================

/// The server-held cart record.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCart {
    /// Lines in display order.
    pub lines: Vec<CartLine>,
    /// Server-computed item count.
    pub total_items: u32,
    /// Server-computed amount.
    pub total_amount: Decimal,
}

/// Response to cart fetch and merge: the full authoritative cart.
#[derive(Debug, Deserialize)]
pub struct CartEnvelope {
    pub message: String,
    pub cart: RemoteCart,
}

/// Response to line mutations: updated aggregate figures only.
#[derive(Debug, Deserialize)]
pub struct TotalsEnvelope {
    pub message: String,
    pub total_items: u32,
    pub total_amount: Decimal,
}

/// Response to operations with no payload (clear, favorite remove).
#[derive(Debug, Deserialize)]
pub struct AckEnvelope {
    pub message: String,
}

/// Response to `GET /favorites`.
#[derive(Debug, Deserialize)]
pub struct FavoritesEnvelope {
    pub message: String,
    pub favorites: Vec<FavoriteEntry>,
}

/// Response to `POST /favorites`: the stored entry, stamped server-side.
#[derive(Debug, Deserialize)]
pub struct FavoriteEnvelope {
    pub message: String,
    pub favorite: FavoriteEntry,
}

/// Response to `GET /favorites/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct PresenceEnvelope {
    pub message: String,
    pub favorite: bool,
}

/// Response to `GET /favorites/count`.
#[derive(Debug, Deserialize)]
pub struct CountEnvelope {
    pub message: String,
    pub count: u64,
}

/// Error body returned with any non-2xx status.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
