//! Page handlers for the snippet UI.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::render::RenderedPage;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ViewParams {
    // Kept as text so a malformed id becomes a 404, not a 400 from the
    // query extractor.
    pub id: Option<String>,
}

/// GET / - list the ten most recent live snippets.
#[tracing::instrument(name = "http.home", skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<RenderedPage> {
    let snippets = state.store.latest().await?;

    let data = json!({
        "title": "Home",
        "snippets": snippets,
    });
    Ok(state.pipeline.render("home.tmpl", StatusCode::OK, &data)?)
}

/// GET /snippet/view?id=N - show one live snippet.
#[tracing::instrument(name = "http.snippet_view", skip(state))]
pub async fn snippet_view(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Result<RenderedPage> {
    let id = params
        .id
        .as_deref()
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|id| *id >= 1)
        .ok_or(AppError::NotFound)?;

    let snippet = state.store.get(id).await?;

    let data = json!({
        "title": snippet.title,
        "snippet": snippet,
    });
    Ok(state.pipeline.render("view.tmpl", StatusCode::OK, &data)?)
}

/// POST /snippet/create - insert a snippet and redirect to its view page.
///
/// TODO: replace the placeholder body with a real create form.
#[tracing::instrument(name = "http.snippet_create", skip(state))]
pub async fn snippet_create(State(state): State<AppState>) -> Result<Redirect> {
    let title = "O snail";
    let content = "O snail\nClimb Mount Fuji,\nBut slowly, slowly!\n\n- Kobayashi Issa";
    let lifetime_days = 7;

    let id = state.store.insert(title, content, lifetime_days).await?;

    Ok(Redirect::to(&format!("/snippet/view?id={id}")))
}
