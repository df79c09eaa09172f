//! Errors produced while serving a file request.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Terminal outcome of a file request that could not be served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    /// Only GET and HEAD are served.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// The request path is unusable, e.g. it contains a `..` segment.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Nothing to serve. Carries the underlying I/O message when there is one.
    #[error("not found{}", detail_suffix(.0))]
    NotFound(Option<String>),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl FileError {
    /// Wrap a filesystem error into `NotFound`, keeping its message.
    pub fn not_found(err: std::io::Error) -> Self {
        Self::NotFound(Some(err.to_string()))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::NotFound(Some(msg)) => msg.clone(),
            _ => self
                .status()
                .canonical_reason()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl IntoResponse for FileError {
    fn into_response(self) -> Response {
        (self.status(), self.message()).into_response()
    }
}
