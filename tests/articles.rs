//! Article CRUD Tests
//!
//! Covers article creation, reading, updating, deleting, listing, and
//! the like toggle.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;

// ===========================================================================
// Creation
// ===========================================================================

#[tokio::test]
async fn create_article_valid() {
    let app = app().await;
    let user = app.create_user("art_create").await;

    let resp = app
        .post_json(
            "/articles",
            json!({ "title": "First post", "content": "Hello board" }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    let body = resp.json();
    assert!(body["id"].is_i64());
    assert_eq!(body["title"].as_str().unwrap(), "First post");
    assert_eq!(body["content"].as_str().unwrap(), "Hello board");
    assert!(body["createdAt"].is_string());
    // The owner id never appears in the response
    assert!(body.get("userId").is_none());
    assert!(body.get("user_id").is_none());
}

#[tokio::test]
async fn create_article_requires_auth() {
    let app = app().await;

    let resp = app
        .post_json(
            "/articles",
            json!({ "title": "No auth", "content": "body" }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_article_empty_title() {
    let app = app().await;
    let user = app.create_user("art_notitle").await;

    let resp = app
        .post_json(
            "/articles",
            json!({ "title": "   ", "content": "body" }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "title cannot be empty");
}

// ===========================================================================
// Reading
// ===========================================================================

#[tokio::test]
async fn get_article_by_id() {
    let app = app().await;
    let user = app.create_user("art_get").await;
    let article_id = app.create_article_for_user(user.id, "Readable").await;

    let resp = app.get(&format!("/articles/{}", article_id), None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["id"].as_i64().unwrap(), article_id);
    assert_eq!(body["title"].as_str().unwrap(), "Readable");
}

#[tokio::test]
async fn get_missing_article() {
    let app = app().await;

    let resp = app.get("/articles/999999999", None).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "article 999999999 not found");
}

// ===========================================================================
// Ownership guard
// ===========================================================================

#[tokio::test]
async fn only_the_owner_can_modify_an_article() {
    let app = app().await;
    let owner = app.create_user("art_owner").await;
    let intruder = app.create_user("art_intruder").await;
    let article_id = app.create_article_for_user(owner.id, "Guarded").await;

    // Someone else's update is rejected
    let resp = app
        .patch_json(
            &format!("/articles/{}", article_id),
            json!({ "title": "Hijacked" }),
            Some(&intruder.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(
        resp.error_message(),
        "only the owner can modify this resource"
    );

    // So is their delete
    let resp = app
        .delete(
            &format!("/articles/{}", article_id),
            Some(&intruder.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    // The owner updates fine
    let resp = app
        .patch_json(
            &format!("/articles/{}", article_id),
            json!({ "title": "Still mine" }),
            Some(&owner.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["title"].as_str().unwrap(), "Still mine");

    // And deletes fine
    let resp = app
        .delete(
            &format!("/articles/{}", article_id),
            Some(&owner.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    // Gone for good
    let resp = app.get(&format!("/articles/{}", article_id), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

/// The whole lifecycle through the public API: register two users, log in,
/// create an article as one, and watch the guard hold against the other.
#[tokio::test]
async fn ownership_scenario_end_to_end() {
    let app = app().await;

    for nick in ["scenario_a", "scenario_b"] {
        let resp = app
            .post_json(
                "/auth/register",
                json!({
                    "email": format!("{}@x.com", nick),
                    "nickname": nick,
                    "password": "pw123456"
                }),
                None,
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED);
    }

    let login = |email: &str| {
        app.post_json(
            "/auth/login",
            json!({ "email": email, "password": "pw123456" }),
            None,
        )
    };
    let token_a = login("scenario_a@x.com")
        .await
        .set_cookie("access_token")
        .expect("login cookie");
    let token_b = login("scenario_b@x.com")
        .await
        .set_cookie("access_token")
        .expect("login cookie");

    let resp = app
        .post_json(
            "/articles",
            json!({ "title": "T1", "content": "scenario body" }),
            Some(&token_a),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let article_id = resp.json()["id"].as_i64().unwrap();

    let resp = app
        .patch_json(
            &format!("/articles/{}", article_id),
            json!({ "title": "T1-stolen" }),
            Some(&token_b),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app
        .patch_json(
            &format!("/articles/{}", article_id),
            json!({ "title": "T1-renamed" }),
            Some(&token_a),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["title"].as_str().unwrap(), "T1-renamed");

    let resp = app
        .delete(&format!("/articles/{}", article_id), Some(&token_b))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app
        .delete(&format!("/articles/{}", article_id), Some(&token_a))
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get(&format!("/articles/{}", article_id), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_article_reports_404_before_ownership() {
    let app = app().await;
    let user = app.create_user("art_404_first").await;

    let resp = app
        .patch_json(
            "/articles/999999999",
            json!({ "title": "ghost" }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn auth_is_checked_before_existence() {
    let app = app().await;

    // No credentials at all: 401 wins even though the article is missing
    let resp = app
        .patch_json("/articles/999999999", json!({ "title": "ghost" }), None)
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let app = app().await;
    let user = app.create_user("art_partial").await;
    let article_id = app.create_article_for_user(user.id, "Original title").await;

    let resp = app
        .patch_json(
            &format!("/articles/{}", article_id),
            json!({ "content": "rewritten body" }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["title"].as_str().unwrap(), "Original title");
    assert_eq!(body["content"].as_str().unwrap(), "rewritten body");
}

#[tokio::test]
async fn delete_removes_the_row() {
    let app = app().await;
    let user = app.create_user("art_delete").await;
    let article_id = app.create_article_for_user(user.id, "Doomed").await;

    let resp = app
        .delete(
            &format!("/articles/{}", article_id),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE id = $1")
        .bind(article_id)
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

// ===========================================================================
// Listing
// ===========================================================================

#[tokio::test]
async fn list_paginates_with_total_count() {
    let app = app().await;
    let user = app.create_user("art_list").await;
    for i in 0..7 {
        app.create_article_for_user(user.id, &format!("listmark_alpha {}", i))
            .await;
    }

    let resp = app
        .get("/articles?keyword=listmark_alpha&page=1&pageSize=5", None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["totalCount"].as_i64().unwrap(), 7);
    assert_eq!(body["list"].as_array().unwrap().len(), 5);

    let resp = app
        .get("/articles?keyword=listmark_alpha&page=2&pageSize=5", None)
        .await;
    let body = resp.json();
    assert_eq!(body["totalCount"].as_i64().unwrap(), 7);
    assert_eq!(body["list"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_default_order_is_by_id() {
    let app = app().await;
    let user = app.create_user("art_order_id").await;
    for i in 0..3 {
        app.create_article_for_user(user.id, &format!("listmark_beta {}", i))
            .await;
    }

    let resp = app.get("/articles?keyword=listmark_beta", None).await;
    let body = resp.json();
    let ids: Vec<i64> = body["list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();

    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "default order is ascending id");
}

#[tokio::test]
async fn list_recent_order_is_newest_first() {
    let app = app().await;
    let user = app.create_user("art_order_recent").await;
    for i in 0..3 {
        app.create_article_for_user(user.id, &format!("listmark_gamma {}", i))
            .await;
    }

    let resp = app
        .get("/articles?keyword=listmark_gamma&orderBy=recent", None)
        .await;
    let body = resp.json();
    let ids: Vec<i64> = body["list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();

    let mut sorted = ids.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted, "recent order is descending");
}

#[tokio::test]
async fn list_keyword_wildcards_are_literal() {
    let app = app().await;
    let user = app.create_user("art_wildcard").await;
    app.create_article_for_user(user.id, "promo 50%_off deltamark")
        .await;
    app.create_article_for_user(user.id, "promo 50x_off deltamark")
        .await;

    // "%" and "_" in the keyword must match themselves, not act as wildcards
    let resp = app.get("/articles?keyword=50%25_off", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["totalCount"].as_i64().unwrap(), 1);
    assert!(body["list"][0]["title"]
        .as_str()
        .unwrap()
        .contains("50%_off"));
}

#[tokio::test]
async fn list_rejects_page_zero() {
    let app = app().await;

    let resp = app.get("/articles?page=0", None).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "page must be at least 1");
}

#[tokio::test]
async fn list_rejects_oversized_page() {
    let app = app().await;

    let resp = app.get("/articles?pageSize=101", None).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "pageSize must be between 1 and 100");
}

// ===========================================================================
// Like toggle
// ===========================================================================

#[tokio::test]
async fn like_toggles_on_and_off() {
    let app = app().await;
    let user = app.create_user("art_like").await;
    let article_id = app.create_article_for_user(user.id, "Likeable").await;

    // First call creates the like
    let resp = app
        .post_json(
            &format!("/articles/{}/like", article_id),
            json!({}),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.json()["isLiked"].as_bool().unwrap(), true);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM article_likes WHERE user_id = $1 AND article_id = $2",
    )
    .bind(user.id)
    .bind(article_id)
    .fetch_one(app.pool())
    .await
    .unwrap();
    assert_eq!(count, 1);

    // Second call removes it
    let resp = app
        .post_json(
            &format!("/articles/{}/like", article_id),
            json!({}),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["isLiked"].as_bool().unwrap(), false);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM article_likes WHERE user_id = $1 AND article_id = $2",
    )
    .bind(user.id)
    .bind(article_id)
    .fetch_one(app.pool())
    .await
    .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn like_missing_article() {
    let app = app().await;
    let user = app.create_user("art_like_404").await;

    let resp = app
        .post_json(
            "/articles/999999999/like",
            json!({}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn like_requires_auth() {
    let app = app().await;
    let user = app.create_user("art_like_noauth").await;
    let article_id = app.create_article_for_user(user.id, "Unreachable like").await;

    let resp = app
        .post_json(&format!("/articles/{}/like", article_id), json!({}), None)
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn liked_list_returns_liked_articles_newest_first() {
    let app = app().await;
    let user = app.create_user("art_liked_list").await;
    let first = app.create_article_for_user(user.id, "Liked first").await;
    let second = app.create_article_for_user(user.id, "Liked second").await;

    for id in [first, second] {
        let resp = app
            .post_json(
                &format!("/articles/{}/like", id),
                json!({}),
                Some(&user.access_token),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED);
    }

    let resp = app
        .get("/articles/like/list", Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["totalCount"].as_i64().unwrap(), 2);

    let ids: Vec<i64> = body["list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first], "most recent like comes first");
}

#[tokio::test]
async fn liked_list_requires_auth() {
    let app = app().await;

    let resp = app.get("/articles/like/list", None).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
