use std::path::Path;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::server::AppState;

use super::handlers::{home, snippet_create, snippet_view};
use super::health::health;

pub fn app_routes(static_dir: &Path) -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/snippet/view", get(snippet_view))
        .route("/snippet/create", post(snippet_create))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(static_dir))
}
