//! Render pipeline: page-name resolution plus template execution.
//!
//! Handlers hand the pipeline a page name, the status code they have decided
//! on, and a payload. The body is captured in full before a response is
//! constructed, so the status is committed exactly once; a template failure
//! surfaces as an error instead of a half-written page.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde_json::Value;
use thiserror::Error;

use crate::template::{RenderError, TemplateRegistry};

/// Errors produced by [`RenderPipeline::render`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The page name was never compiled at startup. This is a programming
    /// defect in the calling handler, not a user-facing condition.
    #[error("no template compiled for page '{0}'")]
    UnknownPage(String),

    #[error("failed to render page '{page}': {source}")]
    Render {
        page: String,
        #[source]
        source: RenderError,
    },
}

/// A fully rendered response body with its caller-fixed status code.
#[derive(Debug)]
pub struct RenderedPage {
    pub status: StatusCode,
    pub body: String,
}

impl IntoResponse for RenderedPage {
    fn into_response(self) -> Response {
        (self.status, Html(self.body)).into_response()
    }
}

/// Read-only facade over the compiled template registry.
///
/// Cheap to clone; every clone shares the same immutable registry, so
/// concurrent renders never observe each other's state.
#[derive(Clone)]
pub struct RenderPipeline {
    registry: Arc<TemplateRegistry>,
}

impl RenderPipeline {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Execute `page` against `data`, tagging the output with `status`.
    pub fn render(
        &self,
        page: &str,
        status: StatusCode,
        data: &Value,
    ) -> Result<RenderedPage, PipelineError> {
        let compiled = self
            .registry
            .get(page)
            .ok_or_else(|| PipelineError::UnknownPage(page.to_string()))?;

        let body = compiled.render(data).map_err(|source| PipelineError::Render {
            page: page.to_string(),
            source,
        })?;

        Ok(RenderedPage { status, body })
    }

    /// Names of every page compiled at startup, sorted.
    pub fn page_names(&self) -> Vec<&str> {
        self.registry.page_names()
    }
}
