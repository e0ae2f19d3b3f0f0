//! Error types for place search.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Errors that can occur while validating or executing a place search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request failed validation.
    #[error("Invalid search request: {reason}")]
    InvalidRequest { reason: String },

    /// The search backend failed or is unreachable.
    #[error("Search backend error: {reason}")]
    Backend { reason: String },

    /// A backend response or seed record could not be understood.
    #[error("Parse error: {reason}")]
    Parse { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SearchError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        SearchError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn backend(reason: impl std::fmt::Display) -> Self {
        SearchError::Backend {
            reason: reason.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SearchError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            SearchError::Backend { .. } | SearchError::Parse { .. } | SearchError::Json(_) => {
                StatusCode::BAD_GATEWAY
            }
            SearchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<elasticsearch::Error> for SearchError {
    fn from(err: elasticsearch::Error) -> Self {
        SearchError::backend(err)
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Search failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
