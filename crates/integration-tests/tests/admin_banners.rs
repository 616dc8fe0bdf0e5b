//! Hero banner management against running admin and storefront servers.
//!
//! Needs `ADMIN_TEST_EMAIL` and `ADMIN_TEST_PASSWORD` for an admin with
//! write access.

use kirana_integration_tests::{ApiClient, admin_client, storefront_base_url};
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

async fn find_banner(admin: &ApiClient, id: i64) -> Value {
    let banners: Value = admin
        .get("/hero-banners")
        .send()
        .await
        .expect("list banners request failed")
        .json()
        .await
        .expect("banner list is not JSON");
    banners
        .as_array()
        .expect("banner list is not an array")
        .iter()
        .find(|b| b["id"].as_i64() == Some(id))
        .cloned()
        .expect("banner missing from list")
}

async fn create_banner(admin: &ApiClient, title: &str) -> i64 {
    let resp = admin
        .post("/hero-banners")
        .json(&json!({
            "title": title,
            "image": "https://cdn.example.in/banners/festive.jpg",
            "cta": "Shop now",
            "link": "/products",
        }))
        .send()
        .await
        .expect("create banner request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("banner body is not JSON");
    created["id"].as_i64().expect("banner has no id")
}

async fn banner_ids(admin: &ApiClient) -> Vec<i64> {
    let banners: Value = admin
        .get("/hero-banners")
        .send()
        .await
        .expect("list banners request failed")
        .json()
        .await
        .expect("banner list is not JSON");
    banners
        .as_array()
        .expect("banner list is not an array")
        .iter()
        .filter_map(|b| b["id"].as_i64())
        .collect()
}

async fn storefront_shows(id: i64) -> bool {
    let banners: Value = reqwest::get(format!("{}/hero-banners", storefront_base_url()))
        .await
        .expect("storefront banners request failed")
        .json()
        .await
        .expect("storefront banner list is not JSON");
    banners
        .as_array()
        .is_some_and(|list| list.iter().any(|b| b["id"].as_i64() == Some(id)))
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers"]
async fn test_banner_toggle_persists_across_reloads() {
    let admin = admin_client().await;
    let title = format!("Festive sale {}", Uuid::new_v4().simple());

    let resp = admin
        .post("/hero-banners")
        .json(&json!({
            "title": title,
            "image": "https://cdn.example.in/banners/festive.jpg",
            "cta": "Shop now",
            "link": "/products",
        }))
        .send()
        .await
        .expect("create banner request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("banner body is not JSON");
    let id = created["id"].as_i64().expect("banner has no id");
    assert_eq!(created["isActive"], true);
    assert!(storefront_shows(id).await);

    let toggled: Value = admin
        .post(&format!("/hero-banners/{id}/toggle"))
        .send()
        .await
        .expect("toggle request failed")
        .json()
        .await
        .expect("toggle body is not JSON");
    assert_eq!(toggled["isActive"], false);

    // A fresh read sees the stored flag, not the toggle response.
    assert_eq!(find_banner(&admin, id).await["isActive"], false);
    assert!(!storefront_shows(id).await);

    let resp = admin
        .post(&format!("/hero-banners/{id}/toggle"))
        .send()
        .await
        .expect("toggle request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(find_banner(&admin, id).await["isActive"], true);

    let resp = admin
        .delete(&format!("/hero-banners/{id}"))
        .send()
        .await
        .expect("delete banner request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers"]
async fn test_reorder_requires_every_banner_exactly_once() {
    let admin = admin_client().await;
    let id = create_banner(&admin, &format!("Monsoon deals {}", Uuid::new_v4().simple())).await;
    let ids = banner_ids(&admin).await;

    let missing: Vec<i64> = ids.iter().copied().filter(|&b| b != id).collect();
    let mut duplicated = ids.clone();
    duplicated.push(id);
    let mut unknown = ids.clone();
    unknown.push(-1);

    for body in [missing, duplicated, unknown] {
        let resp = admin
            .put("/hero-banners/reorder")
            .json(&json!({ "ids": body }))
            .send()
            .await
            .expect("reorder request failed");
        assert_eq!(resp.status(), StatusCode::CONFLICT, "accepted {body:?}");
        let error: Value = resp.json().await.expect("error body is not JSON");
        assert_eq!(error["error"], "ids must list every banner exactly once");
    }

    let resp = admin
        .delete(&format!("/hero-banners/{id}"))
        .send()
        .await
        .expect("delete banner request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
