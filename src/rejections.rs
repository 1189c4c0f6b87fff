use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::db::SurveyError;

/// Error returned by handlers. Each variant carries the user-facing message;
/// the underlying cause is logged where the error is created.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Conflict(String),
    Input(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::Input(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (code, message).into_response()
    }
}

pub trait ResultExt<T> {
    /// Map a store failure to an [`AppError`] showing `message` to the user.
    fn reject(self, message: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, SurveyError> {
    fn reject(self, message: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|err| {
            let message = message.into();
            match err {
                SurveyError::NotFound { .. } => {
                    tracing::warn!("{message}: {err}");
                    AppError::NotFound(message)
                }
                SurveyError::InvalidState(_) => {
                    tracing::warn!("{message}: {err}");
                    AppError::Conflict(message)
                }
                SurveyError::Validation(_) => {
                    tracing::warn!("{message}: {err}");
                    AppError::Input(message)
                }
                SurveyError::Storage(_) => {
                    tracing::error!("{message}: {err}");
                    AppError::Internal(message)
                }
            }
        })
    }
}
