use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::AppendHeaders,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::articles::ArticleService;
use crate::app::auth::{verify_password, AuthService};
use crate::app::comments::CommentService;
use crate::app::likes::LikeService;
use crate::app::products::ProductService;
use crate::app::ListOrder;
use crate::domain::article::Article;
use crate::domain::comment::{Comment, CommentRecord};
use crate::domain::product::Product;
use crate::domain::user::User;
use crate::domain::Owned;
use crate::http::auth::{clearing_cookies, cookie_value, session_cookies, REFRESH_COOKIE};
use crate::http::{AppError, AuthUser};
use crate::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;
const DEFAULT_FEED_LIMIT: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;
const MAX_COMMENT_LEN: usize = 1000;
const MAX_PASSWORD_LEN: usize = 128;

type SetCookies = AppendHeaders<[(HeaderName, String); 2]>;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Query shape shared by the offset-paginated listings.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub order_by: Option<String>,
    pub keyword: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub list: Vec<T>,
    pub total_count: i64,
}

#[derive(Deserialize)]
pub struct CursorQuery {
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    pub list: Vec<T>,
    pub next_cursor: Option<i64>,
}

/// Resolves page/pageSize into an offset window. Pages are 1-based.
fn resolve_offset(query: &ListQuery) -> Result<(i64, i64), AppError> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page < 1 {
        return Err(AppError::bad_request("page must be at least 1"));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(AppError::bad_request("pageSize must be between 1 and 100"));
    }
    Ok(((page - 1) * page_size, page_size))
}

fn resolve_order(query: &ListQuery) -> ListOrder {
    match query.order_by.as_deref() {
        Some("recent") => ListOrder::Recent,
        _ => ListOrder::IdAsc,
    }
}

fn resolve_limit(limit: Option<i64>) -> Result<i64, AppError> {
    let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 100"));
    }
    Ok(limit)
}

/// Trims a feed page that was fetched with one extra row. The extra row is
/// withheld and its id becomes the cursor for the next call; a short fetch
/// means the feed is exhausted and the cursor stays empty.
fn trim_feed_page(
    mut comments: Vec<CommentRecord>,
    limit: i64,
) -> (Vec<CommentRecord>, Option<i64>) {
    let next_cursor = if comments.len() > limit as usize {
        let extra = comments.pop().expect("checked len");
        Some(extra.id)
    } else {
        None
    };
    (comments, next_cursor)
}

/// Only the owner may mutate a resource. Callers check existence first,
/// so a missing resource reports 404 before this can report 403.
fn assert_ownership<T: Owned>(resource: &T, requester_id: i64) -> Result<(), AppError> {
    if resource.owner_id() != requester_id {
        return Err(AppError::forbidden("only the owner can modify this resource"));
    }
    Ok(())
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.paseto_refresh_key,
        state.access_ttl_minutes,
        state.refresh_ttl_days,
    )
}

/// Maps a unique-violation from the users table onto a field-specific 409.
/// Anything else is logged and collapsed to a 500.
fn map_user_conflict(err: anyhow::Error, context: &'static str) -> AppError {
    if let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() {
        if let Some(db_err) = sqlx_err.as_database_error() {
            if let Some(code) = db_err.code() {
                if code == "23505" {
                    let constraint = db_err.constraint().unwrap_or_default();
                    if constraint.contains("users_email_key") {
                        return AppError::conflict("email already registered");
                    }
                    if constraint.contains("users_nickname_key") {
                        return AppError::conflict("nickname already in use");
                    }
                }
            }
        }
    }
    tracing::error!(error = ?err, "{}", context);
    AppError::internal(context)
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let status = if db { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub nickname: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::bad_request("email cannot be empty"));
    }
    if payload.nickname.trim().is_empty() {
        return Err(AppError::bad_request("nickname cannot be empty"));
    }
    if payload.password.trim().len() < 8 {
        return Err(AppError::bad_request("password must be at least 8 characters"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let service = auth_service(&state);
    let user = service
        .register(payload.email, payload.nickname, payload.password)
        .await
        .map_err(|err| map_user_conflict(err, "failed to register user"))?;

    Ok((StatusCode::CREATED, Json(User::from(user))))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(SetCookies, Json<User>), AppError> {
    if payload.email.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::bad_request("email and password are required"));
    }

    let service = auth_service(&state);
    let login = service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    match login {
        Some((user, tokens)) => {
            let cookies =
                session_cookies(&tokens, state.access_ttl_minutes, state.refresh_ttl_days);
            Ok((cookies, Json(User::from(user))))
        }
        None => Err(AppError::unauthorized("invalid email or password")),
    }
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, SetCookies), AppError> {
    if let Some(token) = cookie_value(&headers, REFRESH_COOKIE) {
        let service = auth_service(&state);
        service.revoke_refresh_token(&token).await.map_err(|err| {
            tracing::error!(error = ?err, "failed to revoke refresh token");
            AppError::internal("failed to logout")
        })?;
    }

    Ok((StatusCode::NO_CONTENT, clearing_cookies()))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, SetCookies), AppError> {
    let token = cookie_value(&headers, REFRESH_COOKIE)
        .ok_or_else(|| AppError::unauthorized("missing refresh token"))?;

    let service = auth_service(&state);
    let tokens = service.refresh(&token).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to refresh tokens");
        AppError::internal("failed to refresh tokens")
    })?;

    match tokens {
        Some(tokens) => Ok((
            StatusCode::NO_CONTENT,
            session_cookies(&tokens, state.access_ttl_minutes, state.refresh_ttl_days),
        )),
        None => Err(AppError::unauthorized("invalid refresh token")),
    }
}

pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let service = auth_service(&state);
    let user = service
        .get_current_user(auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to fetch current user");
            AppError::internal("failed to fetch user")
        })?;

    match user {
        Some(user) => Ok(Json(User::from(user))),
        None => Err(AppError::not_found(format!(
            "user {} not found",
            auth.user_id
        ))),
    }
}

#[derive(Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub nickname: Option<String>,
}

pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<User>, AppError> {
    if let Some(email) = &payload.email {
        if email.trim().is_empty() {
            return Err(AppError::bad_request("email cannot be empty"));
        }
    }
    if let Some(nickname) = &payload.nickname {
        if nickname.trim().is_empty() {
            return Err(AppError::bad_request("nickname cannot be empty"));
        }
    }

    let service = auth_service(&state);
    let current = service
        .get_current_user(auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to fetch current user");
            AppError::internal("failed to update profile")
        })?;
    let current = match current {
        Some(current) => current,
        None => {
            return Err(AppError::not_found(format!(
                "user {} not found",
                auth.user_id
            )))
        }
    };

    // Values equal to what is stored do not count as changes.
    let email = payload.email.filter(|email| *email != current.email);
    let nickname = payload
        .nickname
        .filter(|nickname| *nickname != current.nickname);
    if email.is_none() && nickname.is_none() {
        return Err(AppError::bad_request("nothing to update"));
    }

    let updated = service
        .update_profile(auth.user_id, email, nickname)
        .await
        .map_err(|err| map_user_conflict(err, "failed to update profile"))?;

    Ok(Json(User::from_record(updated)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub password: String,
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    if payload.current_password.trim().is_empty() {
        return Err(AppError::bad_request("currentPassword is required"));
    }
    if payload.password.trim().len() < 8 {
        return Err(AppError::bad_request("password must be at least 8 characters"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }
    if payload.password == payload.current_password {
        return Err(AppError::bad_request(
            "new password must differ from the current one",
        ));
    }

    let service = auth_service(&state);
    let user = service
        .get_current_user(auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to fetch current user");
            AppError::internal("failed to change password")
        })?;
    let user = match user {
        Some(user) => user,
        None => {
            return Err(AppError::not_found(format!(
                "user {} not found",
                auth.user_id
            )))
        }
    };

    let matches =
        verify_password(&payload.current_password, &user.password_hash).map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to verify password");
            AppError::internal("failed to change password")
        })?;
    if !matches {
        return Err(AppError::bad_request("current password does not match"));
    }

    service
        .set_password(auth.user_id, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to set password");
            AppError::internal("failed to change password")
        })?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
}

pub async fn create_article(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title cannot be empty"));
    }
    if payload.content.trim().is_empty() {
        return Err(AppError::bad_request("content cannot be empty"));
    }

    let service = ArticleService::new(state.db.clone());
    let article = service
        .create(auth.user_id, payload.title, payload.content, payload.image)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to create article");
            AppError::internal("failed to create article")
        })?;

    Ok((StatusCode::CREATED, Json(Article::from(article))))
}

pub async fn get_article(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Article>, AppError> {
    let service = ArticleService::new(state.db.clone());
    let article = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, article_id = id, "failed to fetch article");
        AppError::internal("failed to fetch article")
    })?;

    match article {
        Some(article) => Ok(Json(Article::from(article))),
        None => Err(AppError::not_found(format!("article {} not found", id))),
    }
}

#[derive(Deserialize)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

pub async fn update_article(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateArticleRequest>,
) -> Result<Json<Article>, AppError> {
    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(AppError::bad_request("title cannot be empty"));
        }
    }
    if let Some(content) = &payload.content {
        if content.trim().is_empty() {
            return Err(AppError::bad_request("content cannot be empty"));
        }
    }

    let service = ArticleService::new(state.db.clone());
    let existing = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, article_id = id, "failed to fetch article");
        AppError::internal("failed to update article")
    })?;
    let existing = match existing {
        Some(existing) => existing,
        None => return Err(AppError::not_found(format!("article {} not found", id))),
    };
    assert_ownership(&existing, auth.user_id)?;

    let updated = service
        .update(id, payload.title, payload.content, payload.image)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, article_id = id, "failed to update article");
            AppError::internal("failed to update article")
        })?;

    Ok(Json(Article::from_record(updated)?))
}

pub async fn delete_article(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = ArticleService::new(state.db.clone());
    let existing = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, article_id = id, "failed to fetch article");
        AppError::internal("failed to delete article")
    })?;
    let existing = match existing {
        Some(existing) => existing,
        None => return Err(AppError::not_found(format!("article {} not found", id))),
    };
    assert_ownership(&existing, auth.user_id)?;

    let deleted = service.delete(id).await.map_err(|err| {
        tracing::error!(error = ?err, article_id = id, "failed to delete article");
        AppError::internal("failed to delete article")
    })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        tracing::error!(article_id = id, "article vanished mid-delete");
        Err(AppError::internal("failed to delete article"))
    }
}

pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListPage<Article>>, AppError> {
    let (offset, limit) = resolve_offset(&query)?;
    let order = resolve_order(&query);

    let service = ArticleService::new(state.db.clone());
    let (articles, total_count) = service
        .list(order, query.keyword.as_deref(), offset, limit)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list articles");
            AppError::internal("failed to list articles")
        })?;

    Ok(Json(ListPage {
        list: Article::from_records(articles),
        total_count,
    }))
}

pub async fn list_liked_articles(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListPage<Article>>, AppError> {
    let (offset, limit) = resolve_offset(&query)?;

    let service = ArticleService::new(state.db.clone());
    let (articles, total_count) = service
        .liked_by_user(auth.user_id, offset, limit)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to list liked articles");
            AppError::internal("failed to list liked articles")
        })?;

    Ok(Json(ListPage {
        list: Article::from_records(articles),
        total_count,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub is_liked: bool,
}

pub async fn like_article(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<LikeResponse>), AppError> {
    let articles = ArticleService::new(state.db.clone());
    let article = articles.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, article_id = id, "failed to fetch article");
        AppError::internal("failed to toggle like")
    })?;
    if article.is_none() {
        return Err(AppError::not_found(format!("article {} not found", id)));
    }

    let service = LikeService::new(state.db.clone());
    let is_liked = service
        .toggle_article(auth.user_id, id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, article_id = id, "failed to toggle like");
            AppError::internal("failed to toggle like")
        })?;

    let status = if is_liked {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(LikeResponse { is_liked })))
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

pub async fn create_article_comment(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::bad_request("content cannot be empty"));
    }
    if payload.content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request("content exceeds 1000 characters"));
    }

    let articles = ArticleService::new(state.db.clone());
    let article = articles.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, article_id = id, "failed to fetch article");
        AppError::internal("failed to create comment")
    })?;
    if article.is_none() {
        return Err(AppError::not_found(format!("article {} not found", id)));
    }

    let service = CommentService::new(state.db.clone());
    let comment = service
        .create_for_article(auth.user_id, id, payload.content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, article_id = id, "failed to create comment");
            AppError::internal("failed to create comment")
        })?;

    Ok((StatusCode::CREATED, Json(Comment::from(comment))))
}

pub async fn list_article_comments(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Query(query): Query<CursorQuery>,
) -> Result<Json<CursorPage<Comment>>, AppError> {
    let limit = resolve_limit(query.limit)?;

    let articles = ArticleService::new(state.db.clone());
    let article = articles.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, article_id = id, "failed to fetch article");
        AppError::internal("failed to list comments")
    })?;
    if article.is_none() {
        return Err(AppError::not_found(format!("article {} not found", id)));
    }

    let service = CommentService::new(state.db.clone());
    let start = match query.cursor {
        Some(cursor_id) => {
            let start = service
                .resolve_article_cursor(id, cursor_id)
                .await
                .map_err(|err| {
                    tracing::error!(error = ?err, article_id = id, "failed to resolve cursor");
                    AppError::internal("failed to list comments")
                })?;
            match start {
                Some(start) => Some(start),
                None => return Err(AppError::bad_request("invalid cursor")),
            }
        }
        None => None,
    };

    let comments = service
        .list_for_article(id, start, limit + 1)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, article_id = id, "failed to list comments");
            AppError::internal("failed to list comments")
        })?;

    let (comments, next_cursor) = trim_feed_page(comments, limit);

    Ok(Json(CursorPage {
        list: Comment::from_records(comments),
        next_cursor,
    }))
}

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

pub async fn create_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name cannot be empty"));
    }
    if payload.description.trim().is_empty() {
        return Err(AppError::bad_request("description cannot be empty"));
    }
    if payload.price < 0 {
        return Err(AppError::bad_request("price must be at least 0"));
    }

    let service = ProductService::new(state.db.clone());
    let product = service
        .create(
            auth.user_id,
            payload.name,
            payload.description,
            payload.price,
            payload.tags,
            payload.images,
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to create product");
            AppError::internal("failed to create product")
        })?;

    Ok((StatusCode::CREATED, Json(Product::from(product))))
}

pub async fn get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Product>, AppError> {
    let service = ProductService::new(state.db.clone());
    let product = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, product_id = id, "failed to fetch product");
        AppError::internal("failed to fetch product")
    })?;

    match product {
        Some(product) => Ok(Json(Product::from(product))),
        None => Err(AppError::not_found(format!("product {} not found", id))),
    }
}

#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

pub async fn update_product(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("name cannot be empty"));
        }
    }
    if let Some(description) = &payload.description {
        if description.trim().is_empty() {
            return Err(AppError::bad_request("description cannot be empty"));
        }
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::bad_request("price must be at least 0"));
        }
    }

    let service = ProductService::new(state.db.clone());
    let existing = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, product_id = id, "failed to fetch product");
        AppError::internal("failed to update product")
    })?;
    let existing = match existing {
        Some(existing) => existing,
        None => return Err(AppError::not_found(format!("product {} not found", id))),
    };
    assert_ownership(&existing, auth.user_id)?;

    let updated = service
        .update(
            id,
            payload.name,
            payload.description,
            payload.price,
            payload.tags,
            payload.images,
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, product_id = id, "failed to update product");
            AppError::internal("failed to update product")
        })?;

    Ok(Json(Product::from_record(updated)?))
}

pub async fn delete_product(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = ProductService::new(state.db.clone());
    let existing = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, product_id = id, "failed to fetch product");
        AppError::internal("failed to delete product")
    })?;
    let existing = match existing {
        Some(existing) => existing,
        None => return Err(AppError::not_found(format!("product {} not found", id))),
    };
    assert_ownership(&existing, auth.user_id)?;

    let deleted = service.delete(id).await.map_err(|err| {
        tracing::error!(error = ?err, product_id = id, "failed to delete product");
        AppError::internal("failed to delete product")
    })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        tracing::error!(product_id = id, "product vanished mid-delete");
        Err(AppError::internal("failed to delete product"))
    }
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListPage<Product>>, AppError> {
    let (offset, limit) = resolve_offset(&query)?;
    let order = resolve_order(&query);

    let service = ProductService::new(state.db.clone());
    let (products, total_count) = service
        .list(order, query.keyword.as_deref(), offset, limit)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list products");
            AppError::internal("failed to list products")
        })?;

    Ok(Json(ListPage {
        list: Product::from_records(products),
        total_count,
    }))
}

pub async fn list_liked_products(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListPage<Product>>, AppError> {
    let (offset, limit) = resolve_offset(&query)?;

    let service = ProductService::new(state.db.clone());
    let (products, total_count) = service
        .liked_by_user(auth.user_id, offset, limit)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to list liked products");
            AppError::internal("failed to list liked products")
        })?;

    Ok(Json(ListPage {
        list: Product::from_records(products),
        total_count,
    }))
}

pub async fn like_product(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<LikeResponse>), AppError> {
    let products = ProductService::new(state.db.clone());
    let product = products.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, product_id = id, "failed to fetch product");
        AppError::internal("failed to toggle like")
    })?;
    if product.is_none() {
        return Err(AppError::not_found(format!("product {} not found", id)));
    }

    let service = LikeService::new(state.db.clone());
    let is_liked = service
        .toggle_product(auth.user_id, id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, product_id = id, "failed to toggle like");
            AppError::internal("failed to toggle like")
        })?;

    let status = if is_liked {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(LikeResponse { is_liked })))
}

pub async fn create_product_comment(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::bad_request("content cannot be empty"));
    }
    if payload.content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request("content exceeds 1000 characters"));
    }

    let products = ProductService::new(state.db.clone());
    let product = products.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, product_id = id, "failed to fetch product");
        AppError::internal("failed to create comment")
    })?;
    if product.is_none() {
        return Err(AppError::not_found(format!("product {} not found", id)));
    }

    let service = CommentService::new(state.db.clone());
    let comment = service
        .create_for_product(auth.user_id, id, payload.content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, product_id = id, "failed to create comment");
            AppError::internal("failed to create comment")
        })?;

    Ok((StatusCode::CREATED, Json(Comment::from(comment))))
}

pub async fn list_product_comments(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Query(query): Query<CursorQuery>,
) -> Result<Json<CursorPage<Comment>>, AppError> {
    let limit = resolve_limit(query.limit)?;

    let products = ProductService::new(state.db.clone());
    let product = products.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, product_id = id, "failed to fetch product");
        AppError::internal("failed to list comments")
    })?;
    if product.is_none() {
        return Err(AppError::not_found(format!("product {} not found", id)));
    }

    let service = CommentService::new(state.db.clone());
    let start = match query.cursor {
        Some(cursor_id) => {
            let start = service
                .resolve_product_cursor(id, cursor_id)
                .await
                .map_err(|err| {
                    tracing::error!(error = ?err, product_id = id, "failed to resolve cursor");
                    AppError::internal("failed to list comments")
                })?;
            match start {
                Some(start) => Some(start),
                None => return Err(AppError::bad_request("invalid cursor")),
            }
        }
        None => None,
    };

    let comments = service
        .list_for_product(id, start, limit + 1)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, product_id = id, "failed to list comments");
            AppError::internal("failed to list comments")
        })?;

    let (comments, next_cursor) = trim_feed_page(comments, limit);

    Ok(Json(CursorPage {
        list: Comment::from_records(comments),
        next_cursor,
    }))
}

pub async fn update_comment(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<Comment>, AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::bad_request("content cannot be empty"));
    }
    if payload.content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request("content exceeds 1000 characters"));
    }

    let service = CommentService::new(state.db.clone());
    let existing = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, comment_id = id, "failed to fetch comment");
        AppError::internal("failed to update comment")
    })?;
    let existing = match existing {
        Some(existing) => existing,
        None => return Err(AppError::not_found(format!("comment {} not found", id))),
    };
    assert_ownership(&existing, auth.user_id)?;

    let updated = service.update(id, payload.content).await.map_err(|err| {
        tracing::error!(error = ?err, comment_id = id, "failed to update comment");
        AppError::internal("failed to update comment")
    })?;

    Ok(Json(Comment::from_record(updated)?))
}

pub async fn delete_comment(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = CommentService::new(state.db.clone());
    let existing = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, comment_id = id, "failed to fetch comment");
        AppError::internal("failed to delete comment")
    })?;
    let existing = match existing {
        Some(existing) => existing,
        None => return Err(AppError::not_found(format!("comment {} not found", id))),
    };
    assert_ownership(&existing, auth.user_id)?;

    let deleted = service.delete(id).await.map_err(|err| {
        tracing::error!(error = ?err, comment_id = id, "failed to delete comment");
        AppError::internal("failed to delete comment")
    })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        tracing::error!(comment_id = id, "comment vanished mid-delete");
        Err(AppError::internal("failed to delete comment"))
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

const IMAGE_FIELD: &str = "image";

fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        _ => None,
    }
}

pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut image: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("malformed multipart body"))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("malformed multipart body"))?;
        image = Some((content_type, data));
        break;
    }

    let (content_type, data) =
        image.ok_or_else(|| AppError::bad_request("image file is required"))?;
    if data.is_empty() {
        return Err(AppError::bad_request("image file is required"));
    }
    let extension = image_extension(&content_type)
        .ok_or_else(|| AppError::bad_request("only png and jpeg images are accepted"))?;
    if data.len() > state.upload_max_bytes {
        return Err(AppError::bad_request("image exceeds the 5MB limit"));
    }

    let filename = state.images.save(&data, extension).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to store image");
        AppError::internal("failed to store image")
    })?;

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let url = format!("http://{}/static/{}", host, filename);

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}
