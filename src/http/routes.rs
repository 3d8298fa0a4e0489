use axum::extract::DefaultBodyLimit;
use axum::{routing::delete, routing::get, routing::patch, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/refresh", post(handlers::refresh_token))
        .route("/auth/me", get(handlers::get_me))
        .route("/auth/me", patch(handlers::update_me))
        .route("/auth/me/password", patch(handlers::change_password))
}

pub fn articles() -> Router<AppState> {
    Router::new()
        .route("/articles", post(handlers::create_article))
        .route("/articles", get(handlers::list_articles))
        .route("/articles/like/list", get(handlers::list_liked_articles))
        .route("/articles/:id", get(handlers::get_article))
        .route("/articles/:id", patch(handlers::update_article))
        .route("/articles/:id", delete(handlers::delete_article))
        .route("/articles/:id/comments", post(handlers::create_article_comment))
        .route("/articles/:id/comments", get(handlers::list_article_comments))
        .route("/articles/:id/like", post(handlers::like_article))
}

pub fn products() -> Router<AppState> {
    Router::new()
        .route("/products", post(handlers::create_product))
        .route("/products", get(handlers::list_products))
        .route("/products/like/list", get(handlers::list_liked_products))
        .route("/products/:id", get(handlers::get_product))
        .route("/products/:id", patch(handlers::update_product))
        .route("/products/:id", delete(handlers::delete_product))
        .route("/products/:id/comments", post(handlers::create_product_comment))
        .route("/products/:id/comments", get(handlers::list_product_comments))
        .route("/products/:id/like", post(handlers::like_product))
}

pub fn comments() -> Router<AppState> {
    Router::new()
        .route("/comments/:id", patch(handlers::update_comment))
        .route("/comments/:id", delete(handlers::delete_comment))
}

pub fn images(max_upload_bytes: usize) -> Router<AppState> {
    // Axum caps request bodies at 2MB by default; uploads need headroom
    // beyond the image limit for multipart framing.
    Router::new()
        .route("/images/upload", post(handlers::upload_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes + 64 * 1024))
}
