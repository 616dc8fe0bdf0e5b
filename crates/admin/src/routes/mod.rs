//! HTTP route handlers for admin.
//!
//! Every route except login needs `Authorization: Bearer <token>`. Viewers
//! may read everything but the admin user list; writes need `admin` or
//! `super_admin`; admin users and Razorpay credentials need `super_admin`.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /auth/login                  - Exchange credentials for token
//! POST   /auth/logout                 - Revoke current token
//! GET    /auth/me                     - Current admin
//!
//! GET    /dashboard                   - Order counts, revenue, low stock
//!
//! # Catalog
//! GET    /products                    - Product listing (search, category, source, cursor)
//! POST   /products                    - Create product
//! GET    /products/{id}               - Product detail
//! PUT    /products/{id}               - Update product
//! DELETE /products/{id}               - Delete product
//! PATCH  /products/{id}/stock         - Set or clear tracked stock
//! GET    /categories                  - Category list
//! POST   /categories                  - Create category
//! PUT    /categories/{id}             - Update category
//! DELETE /categories/{id}             - Delete category
//!
//! # Hero banners
//! GET    /hero-banners                - All banners in display order
//! POST   /hero-banners                - Create banner
//! PUT    /hero-banners/reorder        - Apply display order
//! PUT    /hero-banners/{id}           - Update banner
//! DELETE /hero-banners/{id}           - Delete banner
//! POST   /hero-banners/{id}/toggle    - Flip active flag
//!
//! # Orders and customers
//! GET    /orders                      - Order listing (status, search, cursor)
//! GET    /orders/{id}                 - Order detail
//! POST   /orders/{id}/status          - Change status
//! GET    /customers                   - Customer listing (search, cursor)
//! GET    /customers/{id}              - Customer detail
//!
//! # Settings
//! GET    /content                     - Store settings
//! PUT    /content/update-content      - Replace store settings
//! GET    /razorpay/settings           - Gateway credentials, secret masked
//! PUT    /razorpay/settings           - Store gateway credentials (super admin)
//!
//! # Admin users (super admin)
//! GET    /admin-users                 - List
//! POST   /admin-users                 - Create
//! DELETE /admin-users/{id}            - Delete
//! ```

pub mod admin_users;
pub mod auth;
pub mod banners;
pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod settings;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::state::AppState;

/// The admin console API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/dashboard", get(dashboard::stats))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/products/{id}/stock", patch(products::set_stock))
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/{id}",
            put(categories::update).delete(categories::delete),
        )
        .route("/hero-banners", get(banners::list).post(banners::create))
        .route("/hero-banners/reorder", put(banners::reorder))
        .route(
            "/hero-banners/{id}",
            put(banners::update).delete(banners::delete),
        )
        .route("/hero-banners/{id}/toggle", post(banners::toggle))
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::change_status))
        .route("/customers", get(customers::list))
        .route("/customers/{id}", get(customers::show))
        .route("/content", get(settings::content))
        .route("/content/update-content", put(settings::update_content))
        .route(
            "/razorpay/settings",
            get(settings::razorpay).put(settings::update_razorpay),
        )
        .route("/admin-users", get(admin_users::list).post(admin_users::create))
        .route("/admin-users/{id}", delete(admin_users::delete))
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

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = routes()
            .with_state(test_state())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn every_console_route_requires_a_token() {
        for (method, uri) in [
            ("GET", "/auth/me"),
            ("POST", "/auth/logout"),
            ("GET", "/dashboard"),
            ("GET", "/products"),
            ("PATCH", "/products/1/stock"),
            ("GET", "/categories"),
            ("POST", "/hero-banners/1/toggle"),
            ("PUT", "/hero-banners/reorder"),
            ("GET", "/orders"),
            ("POST", "/orders/1/status"),
            ("GET", "/customers/1"),
            ("GET", "/content"),
            ("PUT", "/content/update-content"),
            ("GET", "/razorpay/settings"),
            ("PUT", "/razorpay/settings"),
            ("GET", "/admin-users"),
            ("DELETE", "/admin-users/2"),
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
    async fn login_with_malformed_email_is_unauthorized() {
        let request = Request::post("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({"email": "nobody", "password": "x"}).to_string(),
            ))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let request = Request::get("/analytics").body(Body::empty()).unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
