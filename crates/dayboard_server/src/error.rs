//! HTTP error mapping.
//!
//! Storage and worker failures become a generic 500 with a descriptive
//! payload; nothing is retried.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dayboard_core::RepoError;
use log::error;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ApiError {
    Storage(RepoError),
    MalformedBody(serde_json::Error),
    MethodNotAllowed,
    Worker(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Storage(_) | Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage_failed",
            Self::MalformedBody(_) => "malformed_body",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Worker(_) => "worker_failed",
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "storage failure: {err}"),
            Self::MalformedBody(err) => write!(f, "request body is not valid JSON: {err}"),
            Self::MethodNotAllowed => write!(f, "method not allowed"),
            Self::Worker(message) => write!(f, "request worker failed: {message}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::MalformedBody(err) => Some(err),
            Self::MethodNotAllowed | Self::Worker(_) => None,
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(
                "event=http_error module=server status=error error_code={} error={}",
                self.code(),
                self
            );
        }
        (
            status,
            Json(json!({ "error": self.to_string(), "code": self.code() })),
        )
            .into_response()
    }
}
