//! Helpers for end-to-end tests against running Kirana servers.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and create an admin the tests can log in as
//! kr-cli migrate all
//! KR_ADMIN_PASSWORD='correct horse battery' \
//!     kr-cli admin create -e qa@example.in -n "QA Bot" -r super_admin
//!
//! # Start both servers, then:
//! ADMIN_TEST_EMAIL=qa@example.in ADMIN_TEST_PASSWORD='correct horse battery' \
//!     cargo test -p kirana-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `STOREFRONT_BASE_URL` - default `http://localhost:3000`
//! - `ADMIN_BASE_URL` - default `http://localhost:3001`
//! - `ADMIN_TEST_EMAIL`, `ADMIN_TEST_PASSWORD` - credentials of an admin with write access

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the storefront API.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL of the admin API.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client talking to one of the servers with a bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    fn new(base_url: String, token: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&self.token)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&self.token)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(&self.token)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(&self.token)
    }
}

/// Register a throwaway customer and return a client logged in as them.
///
/// Auth routes are rate limited per IP, so a rejected attempt waits for the
/// limiter and tries again.
pub async fn register_customer() -> ApiClient {
    let base_url = storefront_base_url();
    let email = format!("it-{}@example.in", Uuid::new_v4().simple());
    let client = Client::new();

    let mut attempts = 0;
    let resp = loop {
        let resp = client
            .post(format!("{base_url}/auth/register"))
            .json(&json!({
                "email": email,
                "password": "integration-pass-1",
                "fullName": "Integration Tester",
            }))
            .send()
            .await
            .expect("register request failed");
        attempts += 1;
        if resp.status() != StatusCode::TOO_MANY_REQUESTS || attempts == 10 {
            break resp;
        }
        tokio::time::sleep(retry_after(&resp)).await;
    };
    assert_eq!(resp.status(), StatusCode::CREATED, "registration rejected");

    let body: Value = resp.json().await.expect("register body is not JSON");
    let token = body["token"].as_str().expect("no token issued").to_string();
    ApiClient::new(base_url, token)
}

fn retry_after(resp: &Response) -> Duration {
    let secs = resp
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(1);
    Duration::from_secs(secs.max(1))
}

/// Log in as the admin named by `ADMIN_TEST_EMAIL` / `ADMIN_TEST_PASSWORD`.
pub async fn admin_client() -> ApiClient {
    let email = std::env::var("ADMIN_TEST_EMAIL").expect("ADMIN_TEST_EMAIL not set");
    let password = std::env::var("ADMIN_TEST_PASSWORD").expect("ADMIN_TEST_PASSWORD not set");
    admin_login(&email, &password).await
}

/// Log in to the admin API with the given credentials.
pub async fn admin_login(email: &str, password: &str) -> ApiClient {
    let base_url = admin_base_url();
    let resp = Client::new()
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("admin login request failed");
    assert_eq!(resp.status(), StatusCode::OK, "admin login rejected");

    let body: Value = resp.json().await.expect("login body is not JSON");
    let token = body["token"].as_str().expect("no token issued").to_string();
    ApiClient::new(base_url, token)
}

/// A valid address body.
#[must_use]
pub fn sample_address() -> Value {
    json!({
        "fullName": "Asha Menon",
        "street": "12 MG Road",
        "city": "Bengaluru",
        "state": "KA",
        "zipCode": "560001",
        "country": "India",
        "phoneNumber": "9876543210",
        "addressType": "home",
        "isDefault": false,
    })
}

/// Create an active store product with tracked stock and return its id.
pub async fn create_store_product(admin: &ApiClient, stock: i32) -> i64 {
    let resp = admin
        .post("/products")
        .json(&json!({
            "name": format!("Brass diya {}", Uuid::new_v4().simple()),
            "description": "Hand polished",
            "price": "249.00",
            "source": "store",
            "stock": stock,
        }))
        .send()
        .await
        .expect("create product request failed");
    assert_eq!(resp.status(), StatusCode::CREATED, "product rejected");
    let product: Value = resp.json().await.expect("product body is not JSON");
    product["id"].as_i64().expect("product has no id")
}

/// Current tracked stock of a product as the admin sees it.
pub async fn product_stock(admin: &ApiClient, id: i64) -> Option<i64> {
    let product: Value = admin
        .get(&format!("/products/{id}"))
        .send()
        .await
        .expect("product request failed")
        .json()
        .await
        .expect("product body is not JSON");
    product["stock"].as_i64()
}

/// Put `quantity` of a product in the customer's cart.
pub async fn add_to_cart(customer: &ApiClient, product_id: i64, quantity: i64) {
    let resp = customer
        .post("/cart/items")
        .json(&json!({ "productId": product_id, "quantity": quantity }))
        .send()
        .await
        .expect("add to cart request failed");
    assert_eq!(resp.status(), StatusCode::OK, "cart add rejected");
}

/// A cash on delivery placement shipping to a new address.
#[must_use]
pub fn cod_order(idempotency_key: Option<&str>) -> Value {
    json!({
        "shipping": { "type": "new", "address": sample_address() },
        "paymentMethod": "cash_on_delivery",
        "idempotencyKey": idempotency_key,
    })
}
