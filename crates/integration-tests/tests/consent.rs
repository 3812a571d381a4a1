//! Consent transitions through the router.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;
use tidewater_integration_tests::TestApp;

#[tokio::test]
async fn test_decline_clears_every_client_cookie() {
    let app = TestApp::new();

    let resp = app
        .call(
            Method::POST,
            "/api/consent",
            &[
                ("cookie-consent", "accepted"),
                ("cart-id", "cart_0001"),
                ("auth-token", "tok_ada"),
                ("theme", "dark"),
            ],
            Some(json!({ "decision": "declined" })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["previous"], "accepted");
    assert_eq!(resp.json["decision"], "declined");
    assert_eq!(resp.json["clearLocalStorage"], true);

    for name in ["cart-id", "auth-token", "theme"] {
        let cookie = resp.set_cookie(name).unwrap();
        assert!(cookie.contains("Max-Age=0"), "{name} not expired: {cookie}");
    }
    assert!(resp.set_cookie("cookie-consent").is_none());
    assert_eq!(resp.set_cookies().len(), 3);
}

#[tokio::test]
async fn test_first_decline_from_undecided_also_clears() {
    let app = TestApp::new();

    let resp = app
        .call(
            Method::POST,
            "/api/consent",
            &[("cart-id", "cart_0001")],
            Some(json!({ "decision": "declined" })),
        )
        .await;

    assert_eq!(resp.json["clearLocalStorage"], true);
    assert!(resp.set_cookie("cart-id").is_some());
}

#[tokio::test]
async fn test_accept_writes_nothing() {
    let app = TestApp::new();

    let resp = app
        .call(
            Method::POST,
            "/api/consent",
            &[("cart-id", "cart_0001")],
            Some(json!({ "decision": "accepted" })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["previous"], "undecided");
    assert_eq!(resp.json["clearLocalStorage"], false);
    assert!(resp.set_cookies().is_empty());
}

#[tokio::test]
async fn test_repeating_decline_is_not_a_reset() {
    let app = TestApp::new();

    let resp = app
        .call(
            Method::POST,
            "/api/consent",
            &[("cookie-consent", "declined"), ("theme", "dark")],
            Some(json!({ "decision": "declined" })),
        )
        .await;

    assert_eq!(resp.json["clearLocalStorage"], false);
    assert!(resp.set_cookies().is_empty());
}

#[tokio::test]
async fn test_invalid_transitions_are_rejected() {
    let app = TestApp::new();

    let revert = app
        .call(
            Method::POST,
            "/api/consent",
            &[("cookie-consent", "accepted")],
            Some(json!({ "decision": "undecided" })),
        )
        .await;
    assert_eq!(revert.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .call(Method::POST, "/api/consent", &[], Some(json!({ "decision": "maybe" })))
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert!(unknown.json["error"].is_string());
}
