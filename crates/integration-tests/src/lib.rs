//! Integration test harness for Hadiya.
//!
//! Spins up a wiremock double of the shop API and wires a full
//! [`Storefront`] to it, with a temporary stash slot, so tests can walk the
//! complete sign-in/merge/mutate/sign-out journeys the way the host UI
//! would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hadiya-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hadiya_core::{CartLine, CartTotals, LocalizedText, ProductId, ProductSnapshot};
use hadiya_sync::Storefront;
use hadiya_sync::config::SyncConfig;

/// A storefront wired to a mock shop API.
pub struct TestHarness {
    pub server: MockServer,
    pub storefront: Storefront,
    _stash_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Start the mock API and build a storefront pointing at it.
    ///
    /// # Panics
    ///
    /// Panics if the harness cannot be constructed.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let stash_dir = tempfile::tempdir().expect("create temp dir");

        let config = SyncConfig::new(
            server.uri().parse().expect("mock server uri"),
            stash_dir.path().join("cart-stash.json"),
        );
        let storefront = Storefront::new(config).expect("build storefront");

        Self {
            server,
            storefront,
            _stash_dir: stash_dir,
        }
    }

    /// Mount `GET /favorites` answering with the given entries any number
    /// of times.
    pub async fn mount_favorites(&self, entries: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/favorites"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Favorites loaded",
                "favorites": entries,
            })))
            .mount(&self.server)
            .await;
    }
}

/// A test bearer credential.
#[must_use]
pub fn bearer() -> SecretString {
    SecretString::from("integration-test-token")
}

/// A product snapshot with a bilingual name and a decimal price.
///
/// # Panics
///
/// Panics if `price` is not a decimal literal.
#[must_use]
pub fn product(id: i32, price: &str) -> ProductSnapshot {
    ProductSnapshot {
        product_id: ProductId::new(id),
        name: LocalizedText::new(format!("Gift {id}"), format!("هدية {id}")),
        unit_price: Decimal::from_str(price).expect("decimal literal"),
        image: format!("/images/{id}.webp"),
    }
}

/// A cart line for the given product.
#[must_use]
pub fn line(id: i32, price: &str, quantity: u32) -> CartLine {
    CartLine::new(product(id, price), quantity)
}

/// A full cart envelope body with server-computed totals.
#[must_use]
pub fn cart_body(lines: &[CartLine], message: &str) -> serde_json::Value {
    let totals = CartTotals::of(lines);
    serde_json::json!({
        "message": message,
        "cart": {
            "lines": lines,
            "total_items": totals.items,
            "total_amount": totals.amount.to_string(),
        }
    })
}

/// A totals-only envelope body (line mutations).
#[must_use]
pub fn totals_body(items: u32, amount: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "message": message,
        "total_items": items,
        "total_amount": amount,
    })
}
