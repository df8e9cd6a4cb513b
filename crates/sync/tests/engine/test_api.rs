//! API client behavior: credential attachment, status mapping, and
//! envelope parsing.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hadiya_sync::api::{ApiClient, ApiError};
use hadiya_sync::config::SyncConfig;

use crate::common::{self, cart_body, error_body, line, product};

fn client_for(server: &MockServer) -> ApiClient {
    let config = SyncConfig::new(
        server.uri().parse().expect("mock server uri"),
        std::env::temp_dir().join("hadiya-api-test-stash.json"),
    );
    ApiClient::new(&config).expect("build client")
}

#[tokio::test]
async fn test_bearer_credential_is_attached() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    client.set_bearer(common::bearer()).await;

    Mock::given(method("GET"))
        .and(path("/cart"))
        .and(header("authorization", "Bearer test-bearer-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(cart_body(&[line(1, "5.00", 1)], "Cart loaded")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let envelope = client.fetch_cart().await.expect("fetch");
    assert_eq!(envelope.message, "Cart loaded");
    assert_eq!(envelope.cart.total_items, 1);
}

#[tokio::test]
async fn test_rejected_credential_maps_to_unauthorized() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body("Session expired")))
        .mount(&server)
        .await;

    let err = client.fetch_cart().await.expect_err("should fail");
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(err.to_string(), "Session expired");
}

#[tokio::test]
async fn test_invalid_quantity_maps_to_validation() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/cart/lines"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(error_body("quantity must be at least 1")),
        )
        .mount(&server)
        .await;

    let err = client
        .add_cart_line(&product(1, "5.00"), 1)
        .await
        .expect_err("should fail");
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(err.to_string(), "quantity must be at least 1");
}

#[tokio::test]
async fn test_conflict_maps_to_duplicate() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/favorites"))
        .respond_with(ResponseTemplate::new(409).set_body_json(error_body("Already in favorites")))
        .mount(&server)
        .await;

    let err = client
        .add_favorite(&product(1, "5.00"))
        .await
        .expect_err("should fail");
    assert!(err.is_duplicate());
}

#[tokio::test]
async fn test_plain_text_error_body_is_preserved() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client.fetch_cart().await.expect_err("should fail");
    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_success_body_is_a_parse_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.fetch_cart().await.expect_err("should fail");
    assert!(matches!(err, ApiError::Parse(_)));
}
