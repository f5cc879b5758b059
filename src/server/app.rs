use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::app_routes;

use super::AppState;

pub fn create_app(state: AppState) -> Router {
    app_routes(&state.settings.ui.static_dir)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
