//! Errors returned by JSON handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::ContentError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Upstream(ContentError),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(err) => {
                tracing::error!("Content API error: {}", err);
                (
                    StatusCode::BAD_GATEWAY,
                    "Content API unavailable".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::InvalidCursor(cursor) => {
                AppError::BadRequest(format!("Invalid cursor: {}", cursor))
            }
            other => AppError::Upstream(other),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}
