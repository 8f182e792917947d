// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// One or more validation messages, joined for display.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Admin access required")]
    AdminRequired,

    #[error("Poll not found")]
    PollNotFound,

    #[error("Invalid option index")]
    InvalidOption,

    /// Backend message, passed through as-is.
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Backend(err.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidOption => StatusCode::BAD_REQUEST,
            AppError::NotLoggedIn => StatusCode::UNAUTHORIZED,
            AppError::AdminRequired => StatusCode::FORBIDDEN,
            AppError::PollNotFound => StatusCode::NOT_FOUND,
            AppError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Failure of a read handler. Renders with a `data: null` field so reads keep
/// the `{ data, error }` shape on every path.
#[derive(Debug)]
pub struct ReadError(pub AppError);

impl From<AppError> for ReadError {
    fn from(err: AppError) -> Self {
        ReadError(err)
    }
}

impl IntoResponse for ReadError {
    fn into_response(self) -> Response {
        let ReadError(err) = self;
        (
            err.status(),
            Json(json!({ "data": null, "error": err.to_string() })),
        )
            .into_response()
    }
}
