use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::pages::{error_note, layout, Nav};
use crate::query::QueryError;

/// Page-level error type.
/// Implements `IntoResponse` so page handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Api(#[from] QueryError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Api(err) => {
                tracing::warn!("Backend request failed: {err}");
                (StatusCode::BAD_GATEWAY, err.message().to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = format!(
            "{}<p><a href=\"javascript:history.back()\">Back</a></p>",
            error_note("Something went wrong", &message)
        );

        (status, layout(Nav::Dashboard, "Error", "", &body)).into_response()
    }
}
