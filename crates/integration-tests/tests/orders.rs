//! Order placement, replay and cancellation against running servers.
//!
//! Needs `ADMIN_TEST_EMAIL` and `ADMIN_TEST_PASSWORD` for an admin with
//! write access, used to create stocked products and read their stock.

use kirana_integration_tests::{
    ApiClient, add_to_cart, admin_client, cod_order, create_store_product, product_stock,
    register_customer,
};
use reqwest::{Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

async fn place(customer: &ApiClient, key: Option<&str>) -> Response {
    customer
        .post("/orders")
        .json(&cod_order(key))
        .send()
        .await
        .expect("place order request failed")
}

async fn placed_order_id(resp: Response) -> i64 {
    let body: Value = resp.json().await.expect("order body is not JSON");
    body["order"]["id"].as_i64().expect("order has no id")
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers"]
async fn test_last_unit_is_sold_only_once() {
    let admin = admin_client().await;
    let product = create_store_product(&admin, 1).await;

    let first = register_customer().await;
    let second = register_customer().await;
    add_to_cart(&first, product, 1).await;
    add_to_cart(&second, product, 1).await;

    let (a, b) = tokio::join!(place(&first, None), place(&second, None));
    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    assert_eq!(product_stock(&admin, product).await, Some(0));
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers"]
async fn test_repeated_idempotency_key_returns_same_order() {
    let admin = admin_client().await;
    let product = create_store_product(&admin, 5).await;
    let customer = register_customer().await;
    add_to_cart(&customer, product, 1).await;

    let key = Uuid::new_v4().to_string();
    let (a, b) = tokio::join!(place(&customer, Some(&key)), place(&customer, Some(&key)));
    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CREATED]);

    let first_id = placed_order_id(a).await;
    assert_eq!(placed_order_id(b).await, first_id);

    // The cart is empty now; the key still resolves to the order.
    let again = place(&customer, Some(&key)).await;
    assert_eq!(again.status(), StatusCode::OK);
    let body: Value = again.json().await.expect("order body is not JSON");
    assert_eq!(body["replayed"], true);
    assert_eq!(body["order"]["id"].as_i64(), Some(first_id));

    // Stock was taken once.
    assert_eq!(product_stock(&admin, product).await, Some(4));
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers"]
async fn test_customer_cancel_restores_stock() {
    let admin = admin_client().await;
    let product = create_store_product(&admin, 3).await;
    let customer = register_customer().await;
    add_to_cart(&customer, product, 2).await;

    let resp = place(&customer, None).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order = placed_order_id(resp).await;
    assert_eq!(product_stock(&admin, product).await, Some(1));

    let resp = customer
        .post(&format!("/orders/{order}/cancel"))
        .send()
        .await
        .expect("cancel request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: Value = resp.json().await.expect("order body is not JSON");
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(product_stock(&admin, product).await, Some(3));

    // A second cancel must not restore the stock again.
    let resp = customer
        .post(&format!("/orders/{order}/cancel"))
        .send()
        .await
        .expect("cancel request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(product_stock(&admin, product).await, Some(3));
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers"]
async fn test_admin_cancel_restores_stock() {
    let admin = admin_client().await;
    let product = create_store_product(&admin, 2).await;
    let customer = register_customer().await;
    add_to_cart(&customer, product, 2).await;

    let resp = place(&customer, None).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order = placed_order_id(resp).await;
    assert_eq!(product_stock(&admin, product).await, Some(0));

    let resp = admin
        .post(&format!("/orders/{order}/status"))
        .json(&json!({ "status": "cancelled", "note": "Customer called to cancel" }))
        .send()
        .await
        .expect("status change request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let detail: Value = resp.json().await.expect("order body is not JSON");
    assert_eq!(detail["status"], "cancelled");
    assert_eq!(product_stock(&admin, product).await, Some(2));

    let mine: Value = customer
        .get(&format!("/orders/{order}"))
        .send()
        .await
        .expect("order request failed")
        .json()
        .await
        .expect("order body is not JSON");
    assert_eq!(mine["status"], "cancelled");
}
