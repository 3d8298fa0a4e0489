use axum::Router;
use tower_http::services::ServeDir;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::AuthUser;
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.images.root().to_path_buf());
    let max_upload_bytes = state.upload_max_bytes;

    Router::new()
        .merge(routes::health())
        .merge(routes::auth())
        .merge(routes::articles())
        .merge(routes::products())
        .merge(routes::comments())
        .merge(routes::images(max_upload_bytes))
        .nest_service("/static", static_files)
        .with_state(state)
}
