use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid input.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Missing, malformed or rejected credentials.
    #[error("{0}")]
    Unauthorized(String),

    #[error("Incorrect email or password")]
    BadCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn missing_field(field: &str) -> Self {
        Self::Validation(format!("Missing '{}' in request body", field))
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized request".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadCredentials | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Raw detail of an internal error, carried on the response for the development-mode mapper.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Internal(e) => {
                error!(error = ?e, "unhandled error");
                let mut res = (
                    status,
                    Json(json!({ "error": { "message": "server error" } })),
                )
                    .into_response();
                res.extensions_mut()
                    .insert(InternalErrorDetail(format!("{:#}", e)));
                res
            }
            other => (
                status,
                Json(json!({ "error": { "message": other.to_string() } })),
            )
                .into_response(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Adds the raw error detail to 500 responses outside production.
pub async fn expose_internal_errors(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let res = next.run(req).await;
    if state.config.is_production() {
        return res;
    }
    match res.extensions().get::<InternalErrorDetail>().cloned() {
        Some(InternalErrorDetail(detail)) => (
            res.status(),
            Json(json!({ "message": detail, "error": { "message": "server error" } })),
        )
            .into_response(),
        None => res,
    }
}
