use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid range: end {end} precedes start {start}")]
    InvalidRange { start: i64, end: i64 },

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("not found: {0}")]
    MissingResource(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl Error {
    fn error_type(&self) -> &'static str {
        match self {
            Error::InvalidRange { .. } => "InvalidRange",
            Error::BackendUnavailable(_) => "BackendUnavailable",
            Error::MissingResource(_) => "MissingResource",
            Error::InvalidInput(_) => "InvalidInput",
            Error::Io(_) | Error::Internal(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRange { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::MissingResource(_) => StatusCode::NOT_FOUND,
            Error::BackendUnavailable(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Browser clients expect a bare 400 for bad coordinates
        if let Error::InvalidRange { .. } = self {
            return self.status_code().into_response();
        }

        tracing::error!(error = %self, "request failed");
        let body = ErrorBody {
            error: self.error_type(),
            message: self.to_string(),
        };
        (self.status_code(), axum::Json(body)).into_response()
    }
}
