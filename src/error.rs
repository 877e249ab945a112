use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// SessionError
///
/// Failures raised by a `SessionStore` backend or by an impersonation transition
/// that is not allowed from the current session state.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage failure: {0}")]
    Storage(String),

    #[error("session payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no active session")]
    NoSession,

    #[error("session is not impersonating another user")]
    NotImpersonating,

    #[error("session is already impersonating another user")]
    AlreadyImpersonating,
}

impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        SessionError::Storage(err.to_string())
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            SessionError::NoSession => StatusCode::UNAUTHORIZED,
            SessionError::NotImpersonating | SessionError::AlreadyImpersonating => {
                StatusCode::CONFLICT
            }
            SessionError::Storage(_) | SessionError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_body(status, self.to_string())
    }
}

/// ApiError
///
/// Failures of a call against the remote platform API. Remote 4xx answers keep
/// their status so the UI can show the right message; everything else is a
/// gateway failure from the portal's point of view.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("platform API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("platform API answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("resource not found")]
    NotFound,

    #[error("platform API response could not be decoded: {0}")]
    Decode(String),

    #[error("platform API unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    /// The HTTP status the portal answers with when this error reaches a handler.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Status { status, .. } if (400..500).contains(status) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_body(self.status_code(), self.to_string())
    }
}

/// ConfigError
///
/// Raised by `AppConfig::load` when a setting required by the current
/// environment is missing or malformed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// AppError
///
/// What portal handlers return: any of the above, plus input validation and
/// object-storage failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("session cookie could not be signed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Validation(String),

    #[error("object storage failure: {0}")]
    Storage(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Api(e) => e.into_response(),
            AppError::Session(e) => e.into_response(),
            AppError::Validation(message) => error_body(StatusCode::UNPROCESSABLE_ENTITY, message),
            AppError::Token(_) | AppError::Storage(_) => {
                tracing::error!(error = %self, "request failed");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        }
    }
}
