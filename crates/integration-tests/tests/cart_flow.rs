//! Cart lookup-or-create, update and cart reference endpoints, driven
//! through the full router.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;
use tidewater_core::RegionId;
use tidewater_integration_tests::TestApp;

const ACCEPTED: (&str, &str) = ("cookie-consent", "accepted");

#[tokio::test]
async fn test_uk_with_consent_creates_and_persists_cart() {
    let app = TestApp::new();

    let resp = app.get("/api/cart?country_code=uk", &[ACCEPTED]).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["region"]["currency_code"], "GBP");
    assert_eq!(resp.json["cart"]["currency_code"], "GBP");
    assert_eq!(resp.json["cookieConsentRequired"], false);
    assert_eq!(resp.json["created"], true);

    let cookie = resp.set_cookie("cart-id").unwrap().to_ascii_lowercase();
    let cart_id = resp.json["cart"]["id"].as_str().unwrap();
    assert!(cookie.starts_with(&format!("cart-id={cart_id}")));
    assert!(cookie.contains("max-age=604800"));
    assert!(cookie.contains("httponly"));
    assert!(cookie.contains("samesite=strict"));
    assert!(cookie.contains("path=/"));
    assert!(!cookie.contains("secure"));
}

#[tokio::test]
async fn test_undecided_consent_creates_cart_without_cookie() {
    let app = TestApp::new();

    let resp = app.get("/api/cart?country_code=uk", &[]).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["cookieConsentRequired"], true);
    assert!(resp.json["cart"]["id"].is_string());
    assert!(resp.set_cookies().is_empty());
    assert_eq!(app.backend.calls().create_cart, 1);
}

#[tokio::test]
async fn test_declined_consent_never_writes_cookie() {
    let app = TestApp::new();

    let resp = app
        .call(
            Method::POST,
            "/api/cart",
            &[("cookie-consent", "declined")],
            Some(json!({ "country_code": "us" })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["cookieConsentRequired"], true);
    assert!(resp.set_cookie("cart-id").is_none());
}

#[tokio::test]
async fn test_existing_cart_is_returned_on_repeat_calls() {
    let app = TestApp::new();
    let cart = app.backend.seed_cart(&RegionId::new("reg_uk"), Vec::new());
    let cookies = [ACCEPTED, ("cart-id", cart.id.as_str())];

    let first = app.get("/api/cart?country_code=gb", &cookies).await;
    let second = app.get("/api/cart?country_code=uk", &cookies).await;

    assert_eq!(first.json["cart"]["id"], cart.id.as_str());
    assert_eq!(second.json["cart"]["id"], cart.id.as_str());
    assert_eq!(first.json["created"], false);
    assert!(first.set_cookies().is_empty());
    assert_eq!(app.backend.calls().create_cart, 0);
}

#[tokio::test]
async fn test_cart_in_other_currency_is_replaced() {
    let app = TestApp::new();
    let dollars = app.backend.seed_cart(&RegionId::new("reg_us"), Vec::new());

    let resp = app
        .get("/api/cart?country_code=de", &[ACCEPTED, ("cart-id", dollars.id.as_str())])
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let new_id = resp.json["cart"]["id"].as_str().unwrap();
    assert_ne!(new_id, dollars.id.as_str());
    assert_eq!(resp.json["cart"]["currency_code"], "EUR");
    assert!(resp.set_cookie("cart-id").unwrap().starts_with(&format!("cart-id={new_id}")));

    // The old cart is left to the backend.
    assert!(app.backend.cart(&dollars.id).is_some());
}

#[tokio::test]
async fn test_stale_reference_without_consent_sets_no_cookie() {
    let app = TestApp::new();

    for cookies in [
        vec![("cart-id", "cart_gone")],
        vec![("cart-id", "cart_gone"), ("cookie-consent", "declined")],
    ] {
        let resp = app.get("/api/cart?country_code=uk", &cookies).await;

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.json["created"], true);
        assert_eq!(resp.json["cookieConsentRequired"], true);
        assert!(resp.set_cookie("cart-id").is_none());
    }
}

#[tokio::test]
async fn test_unreachable_referenced_cart_is_replaced() {
    let app = TestApp::new();
    let cart = app.backend.seed_cart(&RegionId::new("reg_uk"), Vec::new());
    app.backend.fail_cart_retrieval(true);

    let accepted = app
        .get("/api/cart?country_code=uk", &[ACCEPTED, ("cart-id", cart.id.as_str())])
        .await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.json["created"], true);
    let new_id = accepted.json["cart"]["id"].as_str().unwrap();
    assert_ne!(new_id, cart.id.as_str());
    assert!(accepted.set_cookie("cart-id").unwrap().starts_with(&format!("cart-id={new_id}")));

    let undecided = app
        .get("/api/cart?country_code=uk", &[("cart-id", cart.id.as_str())])
        .await;
    assert_eq!(undecided.json["created"], true);
    assert!(undecided.set_cookies().is_empty());
}

#[tokio::test]
async fn test_cart_endpoint_rejects_missing_or_unserved_country() {
    let app = TestApp::new();

    let missing = app.get("/api/cart", &[ACCEPTED]).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert!(missing.json["error"].is_string());

    let unserved = app.get("/api/cart?country_code=zz", &[ACCEPTED]).await;
    assert_eq!(unserved.status, StatusCode::BAD_REQUEST);

    let malformed = app
        .call(Method::POST, "/api/cart", &[], Some(json!({ "country": 7 })))
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.backend.calls().create_cart, 0);
}

#[tokio::test]
async fn test_backend_failure_is_500_with_generic_message() {
    let app = TestApp::new();
    app.backend.fail_carts(true);

    let resp = app.get("/api/cart?country_code=uk", &[ACCEPTED]).await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!resp.json["error"].as_str().unwrap().contains("503"));
    assert_eq!(app.backend.calls().create_cart, 1);
}

#[tokio::test]
async fn test_update_applies_allow_listed_fields_only() {
    let app = TestApp::new();
    let cart = app.backend.seed_cart(&RegionId::new("reg_uk"), Vec::new());

    let resp = app
        .call(
            Method::PATCH,
            "/api/cart",
            &[("cart-id", cart.id.as_str())],
            Some(json!({
                "email": "buyer@shop.test",
                "region_id": "reg_us",
                "total": 0,
                "items": []
            })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["cart"]["email"], "buyer@shop.test");
    assert_eq!(resp.json["cart"]["region_id"], "reg_uk");

    let stored = app.backend.cart(&cart.id).unwrap();
    assert_eq!(stored.email.as_deref(), Some("buyer@shop.test"));
    assert_eq!(stored.region_id, cart.region_id);
}

#[tokio::test]
async fn test_update_errors_are_400() {
    let app = TestApp::new();
    let cart = app.backend.seed_cart(&RegionId::new("reg_uk"), Vec::new());

    let no_cookie = app
        .call(Method::PATCH, "/api/cart", &[], Some(json!({ "email": "a@b.co" })))
        .await;
    assert_eq!(no_cookie.status, StatusCode::BAD_REQUEST);

    let unknown_cart = app
        .call(
            Method::PATCH,
            "/api/cart",
            &[("cart-id", "cart_missing")],
            Some(json!({ "email": "a@b.co" })),
        )
        .await;
    assert_eq!(unknown_cart.status, StatusCode::BAD_REQUEST);

    let no_fields = app
        .call(
            Method::PATCH,
            "/api/cart",
            &[("cart-id", cart.id.as_str())],
            Some(json!({ "total": 0 })),
        )
        .await;
    assert_eq!(no_fields.status, StatusCode::BAD_REQUEST);

    let bad_email = app
        .call(
            Method::PATCH,
            "/api/cart",
            &[("cart-id", cart.id.as_str())],
            Some(json!({ "email": "not an email" })),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_id_endpoints() {
    let app = TestApp::new();

    let empty = app.get("/api/cart-id", &[]).await;
    assert_eq!(empty.json["cartId"], serde_json::Value::Null);

    let present = app.get("/api/cart-id", &[("cart-id", "cart_abc")]).await;
    assert_eq!(present.json["cartId"], "cart_abc");

    let gated = app
        .call(Method::POST, "/api/cart-id", &[], Some(json!({ "cartId": "cart_abc" })))
        .await;
    assert_eq!(gated.status, StatusCode::OK);
    assert_eq!(gated.json["persisted"], false);
    assert!(gated.set_cookies().is_empty());

    let persisted = app
        .call(
            Method::POST,
            "/api/cart-id",
            &[ACCEPTED],
            Some(json!({ "cartId": "cart_abc" })),
        )
        .await;
    assert_eq!(persisted.json["persisted"], true);
    assert!(persisted.set_cookie("cart-id").unwrap().contains("Max-Age=604800"));

    for hostile in ["x; Domain=evil.example; SameSite=None", "cart\u{1}x", "a b"] {
        let rejected = app
            .call(Method::POST, "/api/cart-id", &[ACCEPTED], Some(json!({ "cartId": hostile })))
            .await;
        assert_eq!(rejected.status, StatusCode::BAD_REQUEST, "accepted {hostile:?}");
        assert!(rejected.set_cookies().is_empty());
    }

    let blank = app
        .call(Method::POST, "/api/cart-id", &[ACCEPTED], Some(json!({ "cartId": " " })))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let cleared = app
        .call(Method::DELETE, "/api/cart-id", &[("cart-id", "cart_abc")], None)
        .await;
    assert_eq!(cleared.status, StatusCode::NO_CONTENT);
    let cookie = cleared.set_cookie("cart-id").unwrap();
    assert!(cookie.starts_with("cart-id=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_regions_endpoint() {
    let app = TestApp::new();

    let uk = app.get("/api/regions/UK", &[]).await;
    assert_eq!(uk.status, StatusCode::OK);
    assert_eq!(uk.json["id"], "reg_uk");
    assert_eq!(uk.json["currency_code"], "GBP");

    assert_eq!(app.get("/api/regions/zz", &[]).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/api/regions/xyz", &[]).await.status, StatusCode::NOT_FOUND);

    // One region list answers every lookup until it expires.
    for _ in 0..3 {
        app.get("/api/regions/zz", &[]).await;
    }
    app.get("/api/regions/uk", &[]).await;
    assert_eq!(app.backend.calls().list_regions, 1);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = TestApp::new();

    let resp = app.get("/health", &[]).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text, "ok");
    assert!(resp.headers.contains_key("x-request-id"));
}
