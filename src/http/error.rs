//! Mapping from service failures to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::message::services::{ErrorKind, MessageServiceError};

/// Failure returned by a handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The service rejected or failed the operation.
    #[error(transparent)]
    Service(#[from] MessageServiceError),
}

impl ApiError {
    /// Creates a `400` error with `reason` as the message.
    pub fn bad_request(reason: impl std::fmt::Display) -> Self {
        Self::BadRequest(reason.to_string())
    }

    /// Returns the status code this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Service(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "internal server error".to_owned()
        } else {
            debug!(%status, error = %self, "request rejected");
            self.to_string()
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
