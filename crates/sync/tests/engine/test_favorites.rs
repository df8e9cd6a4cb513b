//! Favorites engine behavior: fetch-on-login, duplicate-tolerant add,
//! idempotent removal, and view lifecycle across sign-out.

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use hadiya_core::ProductId;
use hadiya_sync::SyncError;

use crate::common::{
    self, ack_body, error_body, favorite_entry_body, product, sign_in_with_favorites,
};

#[tokio::test]
async fn test_sign_in_fetches_authoritative_list() {
    let ctx = common::setup().await;
    sign_in_with_favorites(
        &ctx,
        1,
        &[favorite_entry_body(3, "9.00"), favorite_entry_body(8, "2.50")],
    )
    .await;

    let favorites = ctx.storefront.favorites();
    assert_eq!(favorites.count().await, 2);
    assert!(favorites.is_favorite(ProductId::new(3)).await);
    assert!(favorites.is_favorite(ProductId::new(8)).await);
    assert!(!favorites.is_favorite(ProductId::new(4)).await);
}

#[tokio::test]
async fn test_add_appends_server_entry() {
    let ctx = common::setup().await;
    sign_in_with_favorites(&ctx, 1, &[]).await;

    Mock::given(method("POST"))
        .and(path("/favorites"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "message": "Added to favorites",
            "favorite": favorite_entry_body(3, "9.00"),
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let favorites = ctx.storefront.favorites();
    favorites.add(&product(3, "9.00")).await.expect("add");

    assert_eq!(favorites.count().await, 1);
    assert!(favorites.is_favorite(ProductId::new(3)).await);
}

#[tokio::test]
async fn test_second_add_short_circuits_client_side() {
    let ctx = common::setup().await;
    sign_in_with_favorites(&ctx, 1, &[favorite_entry_body(3, "9.00")]).await;

    // The presence check runs before any network traffic.
    Mock::given(method("POST"))
        .and(path("/favorites"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let favorites = ctx.storefront.favorites();
    let result = favorites.add(&product(3, "9.00")).await;
    assert!(matches!(result, Err(SyncError::AlreadyFavorite(_))));
    assert_eq!(favorites.count().await, 1);
}

#[tokio::test]
async fn test_duplicate_race_is_benign() {
    let ctx = common::setup().await;
    sign_in_with_favorites(&ctx, 1, &[]).await;

    // Another device won the race between our presence check and the
    // server write; the 409 is absorbed, never shown to the user.
    Mock::given(method("POST"))
        .and(path("/favorites"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(error_body("Already in favorites")),
        )
        .mount(&ctx.server)
        .await;

    let favorites = ctx.storefront.favorites();
    favorites.add(&product(3, "9.00")).await.expect("benign duplicate");

    assert_eq!(favorites.count().await, 1);
    assert!(favorites.is_favorite(ProductId::new(3)).await);
    assert_eq!(ctx.sink.failure_count(), 0);
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let ctx = common::setup().await;
    sign_in_with_favorites(&ctx, 1, &[favorite_entry_body(3, "9.00")]).await;

    Mock::given(method("DELETE"))
        .and(path("/favorites/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ack_body("Removed from favorites")))
        .up_to_n_times(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/favorites/3"))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_body("Not in favorites")))
        .mount(&ctx.server)
        .await;

    let favorites = ctx.storefront.favorites();
    favorites.remove(ProductId::new(3)).await.expect("remove");
    assert_eq!(favorites.count().await, 0);

    // Second removal hits the 404 path and is absorbed.
    favorites.remove(ProductId::new(3)).await.expect("repeat remove");
    assert_eq!(ctx.sink.failure_count(), 0);
}

#[tokio::test]
async fn test_mutations_require_sign_in() {
    let ctx = common::setup().await;

    let favorites = ctx.storefront.favorites();
    assert!(matches!(
        favorites.add(&product(1, "5.00")).await,
        Err(SyncError::AuthenticationRequired)
    ));
    assert!(matches!(
        favorites.remove(ProductId::new(1)).await,
        Err(SyncError::AuthenticationRequired)
    ));
    assert_eq!(favorites.count().await, 0);
}

#[tokio::test]
async fn test_failed_add_leaves_view_untouched() {
    let ctx = common::setup().await;
    sign_in_with_favorites(&ctx, 1, &[favorite_entry_body(3, "9.00")]).await;

    Mock::given(method("POST"))
        .and(path("/favorites"))
        .respond_with(ResponseTemplate::new(503).set_body_json(error_body("Try again later")))
        .mount(&ctx.server)
        .await;

    let favorites = ctx.storefront.favorites();
    let result = favorites.add(&product(4, "1.00")).await;
    assert!(matches!(result, Err(SyncError::Transport(_))));
    assert_eq!(favorites.count().await, 1);
    assert!(!favorites.is_favorite(ProductId::new(4)).await);
}

#[tokio::test]
async fn test_clear_all_empties_view_after_confirmation() {
    let ctx = common::setup().await;
    sign_in_with_favorites(
        &ctx,
        1,
        &[favorite_entry_body(3, "9.00"), favorite_entry_body(8, "2.50")],
    )
    .await;

    Mock::given(method("DELETE"))
        .and(path("/favorites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ack_body("Favorites cleared")))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let favorites = ctx.storefront.favorites();
    favorites.clear_all().await.expect("clear all");
    assert_eq!(favorites.count().await, 0);
}

#[tokio::test]
async fn test_sign_out_clears_view() {
    let ctx = common::setup().await;
    sign_in_with_favorites(&ctx, 1, &[favorite_entry_body(3, "9.00")]).await;
    assert_eq!(ctx.storefront.favorites().count().await, 1);

    ctx.storefront.sign_out().await.expect("sign out");

    let favorites = ctx.storefront.favorites();
    assert_eq!(favorites.count().await, 0);
    assert!(!favorites.is_favorite(ProductId::new(3)).await);
}

#[tokio::test]
async fn test_remote_presence_and_count_passthrough() {
    let ctx = common::setup().await;
    sign_in_with_favorites(&ctx, 1, &[favorite_entry_body(3, "9.00")]).await;

    Mock::given(method("GET"))
        .and(path("/favorites/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "In favorites",
            "favorite": true,
        })))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/favorites/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Favorites counted",
            "count": 1,
        })))
        .mount(&ctx.server)
        .await;

    let favorites = ctx.storefront.favorites();
    assert!(favorites.remote_contains(ProductId::new(3)).await.expect("contains"));
    assert_eq!(favorites.remote_count().await.expect("count"), 1);
}
