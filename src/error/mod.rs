//! Application-level error type and HTTP translation.
//!
//! Exactly one error kind maps to a user-visible condition: a missing
//! snippet becomes 404. Every other core failure is logged with its full
//! cause server-side and presented to the user as an opaque 500; storage
//! and template internals never reach a response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::render::PipelineError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// The requested resource does not exist (bad or expired snippet id).
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound | AppError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "Not Found").into_response()
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Storage failure");
                internal_error()
            }
            AppError::Render(e) => {
                tracing::error!(error = %e, "Render failure");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_snippet_maps_to_404() {
        let response = AppError::Store(StoreError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_failure_maps_to_500() {
        let response = AppError::Store(StoreError::Storage(sqlx::Error::PoolClosed)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unknown_page_maps_to_500() {
        let response =
            AppError::Render(PipelineError::UnknownPage("about.tmpl".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
