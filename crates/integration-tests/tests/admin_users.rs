//! Admin user management against a running admin server.
//!
//! `ADMIN_TEST_EMAIL` must name a super admin.

use kirana_integration_tests::{ApiClient, admin_client, admin_login};
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

const PASSWORD: &str = "integration-pass-1";

async fn me(admin: &ApiClient) -> reqwest::Response {
    admin
        .get("/auth/me")
        .send()
        .await
        .expect("me request failed")
}

async fn own_id(admin: &ApiClient) -> i64 {
    let body: Value = me(admin).await.json().await.expect("me body is not JSON");
    body["id"].as_i64().expect("admin has no id")
}

#[tokio::test]
#[ignore = "Requires a running admin server"]
async fn test_admin_cannot_delete_own_account() {
    let admin = admin_client().await;
    let id = own_id(&admin).await;

    let resp = admin
        .delete(&format!("/admin-users/{id}"))
        .send()
        .await
        .expect("delete admin request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body is not JSON");
    assert_eq!(body["error"], "You cannot delete your own account");

    assert_eq!(me(&admin).await.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires a running admin server"]
async fn test_super_admin_can_remove_another_super_admin() {
    let admin = admin_client().await;
    let email = format!("it-admin-{}@example.in", Uuid::new_v4().simple());

    let resp = admin
        .post("/admin-users")
        .json(&json!({
            "email": email,
            "name": "Second Owner",
            "role": "super_admin",
            "password": PASSWORD,
        }))
        .send()
        .await
        .expect("create admin request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("admin body is not JSON");
    let id = created["id"].as_i64().expect("admin has no id");

    // The new super admin is refused on their own account as well.
    let second = admin_login(&email, PASSWORD).await;
    let resp = second
        .delete(&format!("/admin-users/{id}"))
        .send()
        .await
        .expect("delete admin request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // With two super admins either may remove the other.
    let resp = admin
        .delete(&format!("/admin-users/{id}"))
        .send()
        .await
        .expect("delete admin request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(me(&second).await.status(), StatusCode::UNAUTHORIZED);

    let resp = admin
        .delete(&format!("/admin-users/{id}"))
        .send()
        .await
        .expect("delete admin request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
