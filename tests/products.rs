//! Product CRUD Tests
//!
//! Covers product creation with tags and images, ownership, listing with
//! keyword search over name and description, and the like toggle.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;

// ===========================================================================
// Creation
// ===========================================================================

#[tokio::test]
async fn create_product_valid() {
    let app = app().await;
    let user = app.create_user("prod_create").await;

    let resp = app
        .post_json(
            "/products",
            json!({
                "name": "Road bike",
                "description": "Lightly used, well maintained",
                "price": 45000,
                "tags": ["bike", "sport"],
                "images": ["http://localhost/static/bike.png"]
            }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    let body = resp.json();
    assert!(body["id"].is_i64());
    assert_eq!(body["name"].as_str().unwrap(), "Road bike");
    assert_eq!(body["price"].as_i64().unwrap(), 45000);
    assert_eq!(body["tags"].as_array().unwrap().len(), 2);
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
    assert!(body.get("userId").is_none());
}

#[tokio::test]
async fn create_product_defaults_to_empty_arrays() {
    let app = app().await;
    let user = app.create_user("prod_defaults").await;

    let resp = app
        .post_json(
            "/products",
            json!({ "name": "Bare listing", "description": "no frills", "price": 100 }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    let body = resp.json();
    assert_eq!(body["tags"].as_array().unwrap().len(), 0);
    assert_eq!(body["images"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_product_negative_price() {
    let app = app().await;
    let user = app.create_user("prod_negprice").await;

    let resp = app
        .post_json(
            "/products",
            json!({ "name": "Scam", "description": "pays you", "price": -1 }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "price must be at least 0");
}

#[tokio::test]
async fn create_product_requires_auth() {
    let app = app().await;

    let resp = app
        .post_json(
            "/products",
            json!({ "name": "Nope", "description": "nope", "price": 1 }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ===========================================================================
// Reading and ownership
// ===========================================================================

#[tokio::test]
async fn get_missing_product() {
    let app = app().await;

    let resp = app.get("/products/999999999", None).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "product 999999999 not found");
}

#[tokio::test]
async fn only_the_owner_can_modify_a_product() {
    let app = app().await;
    let owner = app.create_user("prod_owner").await;
    let intruder = app.create_user("prod_intruder").await;
    let product_id = app.create_product_for_user(owner.id, "Guarded goods").await;

    let resp = app
        .patch_json(
            &format!("/products/{}", product_id),
            json!({ "price": 1 }),
            Some(&intruder.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(
        resp.error_message(),
        "only the owner can modify this resource"
    );

    let resp = app
        .patch_json(
            &format!("/products/{}", product_id),
            json!({ "price": 2500, "tags": ["updated"] }),
            Some(&owner.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["price"].as_i64().unwrap(), 2500);
    assert_eq!(body["tags"][0].as_str().unwrap(), "updated");
    // Untouched fields survive the partial update
    assert_eq!(body["name"].as_str().unwrap(), "Guarded goods");

    let resp = app
        .delete(
            &format!("/products/{}", product_id),
            Some(&owner.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get(&format!("/products/{}", product_id), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// Listing
// ===========================================================================

#[tokio::test]
async fn list_keyword_searches_name_and_description() {
    let app = app().await;
    let user = app.create_user("prod_search").await;

    let resp = app
        .post_json(
            "/products",
            json!({ "name": "searchmark in the name", "description": "plain", "price": 10 }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = app
        .post_json(
            "/products",
            json!({ "name": "plain", "description": "searchmark in the description", "price": 10 }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = app
        .post_json(
            "/products",
            json!({ "name": "unrelated", "description": "unrelated", "price": 10 }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = app.get("/products?keyword=searchmark", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["totalCount"].as_i64().unwrap(), 2);
}

#[tokio::test]
async fn list_keyword_is_case_sensitive() {
    let app = app().await;
    let user = app.create_user("prod_case").await;
    app.create_product_for_user(user.id, "CaseMark widget").await;

    let resp = app.get("/products?keyword=casemark", None).await;
    assert_eq!(resp.json()["totalCount"].as_i64().unwrap(), 0);

    let resp = app.get("/products?keyword=CaseMark", None).await;
    assert_eq!(resp.json()["totalCount"].as_i64().unwrap(), 1);
}

#[tokio::test]
async fn list_paginates_with_total_count() {
    let app = app().await;
    let user = app.create_user("prod_list").await;
    for i in 0..4 {
        app.create_product_for_user(user.id, &format!("prodmark {}", i))
            .await;
    }

    let resp = app
        .get("/products?keyword=prodmark&page=2&pageSize=3", None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["totalCount"].as_i64().unwrap(), 4);
    assert_eq!(body["list"].as_array().unwrap().len(), 1);
}

// ===========================================================================
// Like toggle
// ===========================================================================

#[tokio::test]
async fn like_toggles_on_and_off() {
    let app = app().await;
    let user = app.create_user("prod_like").await;
    let product_id = app.create_product_for_user(user.id, "Likeable goods").await;

    let resp = app
        .post_json(
            &format!("/products/{}/like", product_id),
            json!({}),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.json()["isLiked"].as_bool().unwrap(), true);

    let resp = app
        .post_json(
            &format!("/products/{}/like", product_id),
            json!({}),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["isLiked"].as_bool().unwrap(), false);
}

#[tokio::test]
async fn liked_list_shows_only_liked_products() {
    let app = app().await;
    let user = app.create_user("prod_liked_list").await;
    let liked = app.create_product_for_user(user.id, "Wanted").await;
    app.create_product_for_user(user.id, "Ignored").await;

    let resp = app
        .post_json(
            &format!("/products/{}/like", liked),
            json!({}),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = app
        .get("/products/like/list", Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["totalCount"].as_i64().unwrap(), 1);
    assert_eq!(body["list"][0]["id"].as_i64().unwrap(), liked);
}
