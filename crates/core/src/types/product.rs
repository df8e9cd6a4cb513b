//! Cart and favorites entry types.
//!
//! A [`ProductSnapshot`] captures the display fields of a catalog product at
//! the moment it enters a cart or a favorites list, so those records stay
//! renderable even if the catalog entry later changes. Prices use
//! [`rust_decimal::Decimal`], never floats.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::text::LocalizedText;

/// Display fields of a catalog product, captured into carts and favorites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Catalog product ID.
    pub product_id: ProductId,
    /// Bilingual display name.
    pub name: LocalizedText,
    /// Unit price in the shop currency.
    pub unit_price: Decimal,
    /// Image reference for display.
    pub image: String,
}

/// One product entry in a cart, carrying a quantity.
///
/// Invariants (maintained by the sync engine, asserted by the remote
/// service): `quantity >= 1`, and `product_id` is unique within one cart.
/// A line whose quantity would drop to zero is removed, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Catalog product ID, the line's key within the cart.
    pub product_id: ProductId,
    /// Bilingual display name.
    pub name: LocalizedText,
    /// Unit price in the shop currency.
    pub unit_price: Decimal,
    /// Image reference for display.
    pub image: String,
    /// Units of this product in the cart. Always >= 1.
    pub quantity: u32,
}

impl CartLine {
    /// Create a line from a product snapshot and a quantity.
    #[must_use]
    pub fn new(product: ProductSnapshot, quantity: u32) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name,
            unit_price: product.unit_price,
            image: product.image,
            quantity,
        }
    }

    /// Price of this line: `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Aggregate cart figures, recomputed from the line set on every read.
///
/// Never stored or incrementally maintained, so they cannot drift out of
/// sync with the lines they summarize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of line quantities.
    pub items: u32,
    /// Sum of line totals in the shop currency.
    pub amount: Decimal,
}

impl CartTotals {
    /// Compute totals over a line set.
    #[must_use]
    pub fn of(lines: &[CartLine]) -> Self {
        Self {
            items: lines.iter().map(|line| line.quantity).sum(),
            amount: lines.iter().map(CartLine::line_total).sum(),
        }
    }

    /// Totals of an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: 0,
            amount: Decimal::ZERO,
        }
    }
}

/// One product on a customer's favorites list.
///
/// At most one entry exists per `(customer, product)` pair; the remote
/// service enforces this as a uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    /// Catalog product ID, unique per customer.
    pub product_id: ProductId,
    /// Bilingual display name.
    pub name: LocalizedText,
    /// Unit price at the time the favorite was added.
    pub unit_price: Decimal,
    /// Image reference for display.
    pub image: String,
    /// When the product was favorited.
    pub added_at: DateTime<Utc>,
}

impl FavoriteEntry {
    /// Create an entry from a product snapshot, stamped now.
    #[must_use]
    pub fn new(product: ProductSnapshot) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name,
            unit_price: product.unit_price,
            image: product.image,
            added_at: Utc::now(),
        }
    }
}
