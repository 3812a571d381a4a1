//! `CommerceClient` against a mocked backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use tidewater_core::{CartId, CartUpdate, CountryCode, Email, RegionId, VariantId};
use tidewater_integration_tests::commerce_config;
use tidewater_storefront::commerce::{CommerceBackend, CommerceClient, CommerceError};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "pk_01HTIDEWATERTEST";

fn client(server: &MockServer) -> CommerceClient {
    CommerceClient::new(&commerce_config(&server.uri())).unwrap()
}

fn cart_json(id: &str, region: &str, currency: &str) -> serde_json::Value {
    json!({
        "cart": {
            "id": id,
            "region_id": region,
            "currency_code": currency,
            "email": null,
            "customer_id": null,
            "items": [],
            "total": 0
        }
    })
}

#[tokio::test]
async fn test_list_regions_sends_key_and_parses_countries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/store/regions"))
        .and(header("x-publishable-api-key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "regions": [{
                "id": "reg_uk",
                "name": "United Kingdom",
                "currency_code": "gbp",
                "countries": [{ "iso_2": "gb" }, { "iso_2": "not-a-country" }],
                "includes_tax": true,
                "tax_rate": "20"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let regions = client(&server).list_regions().await.unwrap();

    assert_eq!(regions.len(), 1);
    let uk = &regions[0];
    assert_eq!(uk.id, RegionId::new("reg_uk"));
    assert_eq!(uk.currency_code.as_str(), "GBP");
    assert_eq!(uk.countries, vec![CountryCode::parse("gb").unwrap()]);
    assert!(uk.tax.includes_tax);
    assert_eq!(uk.tax.tax_rate, Some(Decimal::from(20)));
}

#[tokio::test]
async fn test_missing_cart_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/store/carts/cart_gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "no cart" })))
        .mount(&server)
        .await;

    let err = client(&server)
        .retrieve_cart(&CartId::new("cart_gone"))
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/store/regions"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .mount(&server)
        .await;

    let err = client(&server).list_regions().await.unwrap_err();

    assert!(matches!(err, CommerceError::RateLimited(17)));
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store/carts"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_cart(&RegionId::new("reg_uk"))
        .await
        .unwrap_err();

    assert!(matches!(err, CommerceError::Status { status: 502, .. }));
}

#[tokio::test]
async fn test_create_and_update_cart_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store/carts"))
        .and(body_json(json!({ "region_id": "reg_eu" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_json("cart_1", "reg_eu", "eur")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/store/carts/cart_1"))
        .and(body_json(json!({ "email": "buyer@shop.test" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_json("cart_1", "reg_eu", "eur")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let cart = client.create_cart(&RegionId::new("reg_eu")).await.unwrap();
    assert_eq!(cart.id, CartId::new("cart_1"));
    assert_eq!(cart.currency_code.as_str(), "EUR");

    let update = CartUpdate {
        email: Some(Email::parse("buyer@shop.test").unwrap()),
    };
    client.update_cart(&cart.id, &update).await.unwrap();
}

#[tokio::test]
async fn test_variant_prices_query_and_unpriced_variants() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/store/variants"))
        .and(query_param("region_id", "reg_uk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "variants": [
                { "id": "var_a", "calculated_price": { "calculated_amount": "12.50", "currency_code": "gbp" } },
                { "id": "var_b", "calculated_price": null }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let prices = client
        .variant_prices(
            &RegionId::new("reg_uk"),
            &[VariantId::new("var_a"), VariantId::new("var_b")],
        )
        .await
        .unwrap();

    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0].variant_id, VariantId::new("var_a"));
    assert_eq!(prices[0].price.amount, Decimal::new(1250, 2));

    // No variants, no request.
    let none = client.variant_prices(&RegionId::new("reg_uk"), &[]).await.unwrap();
    assert!(none.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let ids: Vec<String> = requests[0]
        .url
        .query_pairs()
        .filter(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .collect();
    assert_eq!(ids, ["var_a", "var_b"]);
}

#[tokio::test]
async fn test_payment_providers_scope_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/store/payment-providers"))
        .and(query_param("region_id", "reg_us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payment_providers": [{ "id": "pp_card" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/store/payment-providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payment_providers": [{ "id": "pp_manual", "is_enabled": false }]
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let scoped = client
        .list_payment_providers(Some(&RegionId::new("reg_us")))
        .await
        .unwrap();
    assert_eq!(scoped[0].id.as_str(), "pp_card");
    assert!(scoped[0].is_enabled);

    let unscoped = client.list_payment_providers(None).await.unwrap();
    assert_eq!(unscoped[0].id.as_str(), "pp_manual");
    assert!(!unscoped[0].is_enabled);
}

#[tokio::test]
async fn test_customer_lookup_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/store/customers/me"))
        .and(header("authorization", "Bearer tok_ada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customer": {
                "id": "cus_1",
                "email": "ada@example.com",
                "first_name": "Ada",
                "last_name": null,
                "has_account": true
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let customer = client(&server)
        .retrieve_customer(&SecretString::from("tok_ada"))
        .await
        .unwrap();

    assert_eq!(customer.email, "ada@example.com");
    assert_eq!(customer.display_name(), "Ada");
}
