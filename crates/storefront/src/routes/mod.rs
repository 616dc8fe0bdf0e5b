//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /auth/register              - Create account, returns token
//! POST   /auth/login                 - Exchange credentials for token
//! POST   /auth/logout                - Revoke current token (auth)
//! GET    /auth/me                    - Current customer (auth)
//!
//! # Content and catalog
//! GET    /hero-banners               - Active home page banners
//! GET    /store-settings             - Public store profile
//! GET    /categories                 - Category list
//! GET    /products                   - Product listing (filters, cursor)
//! GET    /products/{id}              - Product detail
//!
//! # Cart (auth)
//! GET    /cart                       - Priced cart
//! DELETE /cart                       - Empty cart
//! POST   /cart/items                 - Add product
//! PUT    /cart/items/{product_id}    - Set quantity
//! DELETE /cart/items/{product_id}    - Remove line
//!
//! # Addresses (auth)
//! GET    /addresses                  - Saved addresses
//! POST   /addresses                  - Save address
//! PUT    /addresses/{id}             - Replace address
//! DELETE /addresses/{id}             - Delete, returns remaining addresses
//! POST   /addresses/{id}/default     - Make default
//!
//! # Checkout and orders (auth)
//! GET    /checkout                   - Checkout wizard summary
//! POST   /orders                     - Place order
//! GET    /orders/my-orders           - Order history (cursor)
//! GET    /orders/{id}                - Order detail with timeline
//! POST   /orders/{id}/cancel         - Cancel before shipping
//!
//! # Payments
//! GET    /razorpay/key               - Public key id
//! POST   /razorpay/verify            - Verify payment signature (auth)
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod content;
pub mod orders;
pub mod payments;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Authentication routes, mounted under `/auth`.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Everything except authentication.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/hero-banners", get(content::hero_banners))
        .route("/store-settings", get(content::store_settings))
        .route("/categories", get(catalog::categories))
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{product_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/addresses", get(addresses::list).post(addresses::create))
        .route(
            "/addresses/{id}",
            put(addresses::update).delete(addresses::delete),
        )
        .route("/addresses/{id}/default", post(addresses::set_default))
        .route("/checkout", get(checkout::summary))
        .route("/orders", post(checkout::place_order))
        .route("/orders/my-orders", get(orders::my_orders))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/razorpay/key", get(payments::key))
        .route("/razorpay/verify", post(payments::verify))
}

/// The full storefront API without rate limiting.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .merge(api_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::state::test_state;

    fn app() -> Router {
        routes().with_state(test_state())
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn json_post(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for (method, uri) in [
            ("GET", "/cart"),
            ("GET", "/addresses"),
            ("GET", "/checkout"),
            ("POST", "/orders"),
            ("GET", "/orders/my-orders"),
            ("GET", "/auth/me"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(body["error"], "Authentication required");
        }
    }

    #[tokio::test]
    async fn non_bearer_authorization_is_rejected() {
        let request = Request::get("/cart")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_rejects_invalid_email_before_storage() {
        let (status, body) = send(json_post(
            "/auth/register",
            &serde_json::json!({
                "email": "not-an-email",
                "password": "long enough password",
                "fullName": "Asha Rao",
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid email address");
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let (status, _) = send(json_post(
            "/auth/register",
            &serde_json::json!({
                "email": "asha@example.in",
                "password": "short",
                "fullName": "Asha Rao",
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_product_id_is_a_client_error() {
        let request = Request::get("/products/abc").body(Body::empty()).unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let request = Request::get("/collections").body(Body::empty()).unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
