use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use axum::response::AppendHeaders;

use crate::app::auth::{AuthService, TokenPair};
use crate::http::AppError;
use crate::AppState;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// The refresh cookie is scoped to this path, so browsers only send it
/// back on the refresh endpoint.
pub const REFRESH_COOKIE_PATH: &str = "/auth/refresh";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(&parts.headers, ACCESS_COOKIE)
            .ok_or_else(|| AppError::unauthorized("missing credentials"))?;

        let service = AuthService::new(
            state.db.clone(),
            state.paseto_access_key,
            state.paseto_refresh_key,
            state.access_ttl_minutes,
            state.refresh_ttl_days,
        );
        let session = service.authenticate_access_token(&token).map_err(|err| {
            tracing::error!(error = ?err, "failed to authenticate access token");
            AppError::internal("failed to authenticate")
        })?;

        let session = session.ok_or_else(|| AppError::unauthorized("invalid or expired token"))?;
        Ok(AuthUser {
            user_id: session.user_id,
        })
    }
}

/// Value of a cookie from the Cookie header, if present.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let pair = pair.trim();
        if let Some((key, value)) = pair.split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Set-Cookie headers carrying a fresh token pair.
pub fn session_cookies(
    pair: &TokenPair,
    access_ttl_minutes: u64,
    refresh_ttl_days: u64,
) -> AppendHeaders<[(HeaderName, String); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            format!(
                "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
                ACCESS_COOKIE,
                pair.access_token,
                access_ttl_minutes * 60
            ),
        ),
        (
            header::SET_COOKIE,
            format!(
                "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Lax",
                REFRESH_COOKIE,
                pair.refresh_token,
                REFRESH_COOKIE_PATH,
                refresh_ttl_days * 24 * 60 * 60
            ),
        ),
    ])
}

/// Set-Cookie headers that drop both token cookies.
pub fn clearing_cookies() -> AppendHeaders<[(HeaderName, String); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            format!(
                "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
                ACCESS_COOKIE
            ),
        ),
        (
            header::SET_COOKIE,
            format!(
                "{}=; Path={}; Max-Age=0; HttpOnly; SameSite=Lax",
                REFRESH_COOKIE, REFRESH_COOKIE_PATH
            ),
        ),
    ])
}
