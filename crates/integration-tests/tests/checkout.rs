//! Checkout composition through the router.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use tidewater_core::RegionId;
use tidewater_integration_tests::TestApp;
use tidewater_storefront::testing::FakeBackend;

#[tokio::test]
async fn test_checkout_composes_all_parts() {
    let app = TestApp::new();
    app.backend.set_price("var_tee", "reg_uk", Decimal::new(1800, 2));
    app.backend.set_payment_providers(Some("reg_uk"), &["pp_card"]);
    app.backend.add_customer("tok_ada", "ada@example.com");
    let cart = app.backend.seed_cart(
        &RegionId::new("reg_uk"),
        vec![
            FakeBackend::line_item("li_1", "var_tee", 2, Decimal::new(1500, 2)),
            FakeBackend::line_item("li_2", "var_mug", 1, Decimal::new(900, 2)),
        ],
    );

    let resp = app
        .get(
            "/api/checkout/uk",
            &[
                ("cookie-consent", "accepted"),
                ("cart-id", cart.id.as_str()),
                ("auth-token", "tok_ada"),
            ],
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = &resp.json;
    assert_eq!(body["cart"]["id"], cart.id.as_str());
    assert_eq!(body["region"]["id"], "reg_uk");
    assert_eq!(body["customer"]["email"], "ada@example.com");
    assert_eq!(body["cookieConsentRequired"], false);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["unit_price"], "18.00");
    assert_eq!(items[0]["line_total"], "36.00");
    assert_eq!(items[0]["price_source"], "region");
    assert_eq!(items[1]["unit_price"], "9.00");
    assert_eq!(items[1]["price_source"], "last_known");

    assert_eq!(body["shippingOptions"][0]["id"], "so_standard");
    assert_eq!(body["payment"]["scope"], "region");
    assert_eq!(body["payment"]["providers"][0]["id"], "pp_card");
}

#[tokio::test]
async fn test_checkout_reports_unscoped_payment_fallback() {
    let app = TestApp::new();
    app.backend.set_payment_providers(None, &["pp_manual"]);

    let resp = app.get("/api/checkout/fr", &[]).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["payment"]["scope"], "unscoped");
    assert_eq!(resp.json["payment"]["providers"][0]["id"], "pp_manual");
    assert_eq!(resp.json["customer"], serde_json::Value::Null);
    assert_eq!(resp.json["cookieConsentRequired"], true);
    assert!(resp.set_cookies().is_empty());
}

#[tokio::test]
async fn test_checkout_unknown_region_is_404() {
    let app = TestApp::new();

    let resp = app.get("/api/checkout/zz", &[]).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(app.backend.calls().create_cart, 0);
}

#[tokio::test]
async fn test_checkout_method_failure_is_500() {
    let app = TestApp::new();
    app.backend.fail_methods(true);

    let resp = app.get("/api/checkout/us", &[]).await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test(start_paused = true)]
async fn test_slow_identity_renders_as_guest() {
    let app = TestApp::new();
    app.backend.add_customer("tok_slow", "slow@example.com");
    app.backend.set_customer_latency(Duration::from_secs(45));

    let started = tokio::time::Instant::now();
    let resp = app
        .get("/api/checkout/us", &[("auth-token", "tok_slow")])
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["customer"], serde_json::Value::Null);
    assert!(started.elapsed() < Duration::from_secs(45));
}
