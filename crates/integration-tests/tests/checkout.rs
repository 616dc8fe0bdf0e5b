//! Checkout and address book flows against a running storefront.
//!
//! Run with: `cargo test -p kirana-integration-tests -- --ignored`

use kirana_integration_tests::{ApiClient, register_customer, sample_address};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires a running storefront server"]
async fn test_empty_cart_checkout_redirects_to_cart() {
    let customer = register_customer().await;

    let resp = customer
        .post("/orders")
        // Partial payment is invalid for cash on delivery; the empty cart
        // is reported first.
        .json(&json!({
            "shipping": { "type": "new", "address": sample_address() },
            "paymentMethod": "cash_on_delivery",
            "payPartial": true,
        }))
        .send()
        .await
        .expect("place order request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body is not JSON");
    assert_eq!(body["redirect"], "/cart");
    assert_eq!(body["error"], "Your cart is empty");
}

#[tokio::test]
#[ignore = "Requires a running storefront server"]
async fn test_deleting_only_address_requires_new_address() {
    let customer = register_customer().await;

    let resp = customer
        .post("/addresses")
        .json(&sample_address())
        .send()
        .await
        .expect("create address request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let address: Value = resp.json().await.expect("address body is not JSON");
    // The first address becomes the default.
    assert_eq!(address["isDefault"], true);
    let id = address["id"].as_i64().expect("address has no id");

    let remaining: Value = customer
        .delete(&format!("/addresses/{id}"))
        .send()
        .await
        .expect("delete address request failed")
        .json()
        .await
        .expect("address list is not JSON");
    assert_eq!(remaining, json!([]));

    let listed: Value = customer
        .get("/addresses")
        .send()
        .await
        .expect("list addresses request failed")
        .json()
        .await
        .expect("address list is not JSON");
    assert_eq!(listed, json!([]));

    let summary: Value = customer
        .get("/checkout")
        .send()
        .await
        .expect("checkout request failed")
        .json()
        .await
        .expect("checkout body is not JSON");
    assert_eq!(summary["requiresNewAddress"], true);
    assert_eq!(summary["defaultAddressId"], Value::Null);
    assert_eq!(summary["addresses"], json!([]));
}

async fn create_address(customer: &ApiClient, street: &str) -> i64 {
    let mut body = sample_address();
    body["street"] = json!(street);
    let resp = customer
        .post("/addresses")
        .json(&body)
        .send()
        .await
        .expect("create address request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let address: Value = resp.json().await.expect("address body is not JSON");
    address["id"].as_i64().expect("address has no id")
}

#[tokio::test]
#[ignore = "Requires a running storefront server"]
async fn test_deleting_default_address_promotes_most_recent() {
    let customer = register_customer().await;

    let home = create_address(&customer, "12 MG Road").await;
    let office = create_address(&customer, "4 Residency Road").await;
    let parents = create_address(&customer, "88 Jayanagar 4th Block").await;

    let remaining: Value = customer
        .delete(&format!("/addresses/{home}"))
        .send()
        .await
        .expect("delete address request failed")
        .json()
        .await
        .expect("address list is not JSON");
    let remaining = remaining.as_array().expect("address list is not an array");
    assert_eq!(remaining.len(), 2);

    let defaults: Vec<i64> = remaining
        .iter()
        .filter(|a| a["isDefault"] == true)
        .filter_map(|a| a["id"].as_i64())
        .collect();
    assert_eq!(defaults, vec![parents]);
    assert!(remaining.iter().any(|a| a["id"].as_i64() == Some(office)));

    // Deleting a non-default address leaves the default alone.
    let remaining: Value = customer
        .delete(&format!("/addresses/{office}"))
        .send()
        .await
        .expect("delete address request failed")
        .json()
        .await
        .expect("address list is not JSON");
    assert_eq!(remaining[0]["id"].as_i64(), Some(parents));
    assert_eq!(remaining[0]["isDefault"], true);
}
