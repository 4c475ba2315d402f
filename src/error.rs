/*
 * Responsibility
 * - App-wide ApiError definition
 * - IntoResponse (HTTP status / JSON error body)
 * - Funnel auth / repo / validation failures into one shape:
 *   {"success": false, "error": <status>, "code": "...", "message": "..."}
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::{AuthError, AuthErrorKind};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: u16,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unprocessable: {message}")]
    Unprocessable { message: String },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Unprocessable {
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

// RFC 6750 challenge for bearer failures.
fn challenge(kind: AuthErrorKind) -> Option<HeaderValue> {
    match kind.status() {
        StatusCode::UNAUTHORIZED => Some(HeaderValue::from_static(r#"Bearer error="invalid_token""#)),
        StatusCode::FORBIDDEN => Some(HeaderValue::from_static(
            r#"Bearer error="insufficient_scope""#,
        )),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut www_authenticate = None;

        let (status, code, message) = match self {
            AppError::Auth(err) => {
                www_authenticate = challenge(err.kind());
                (err.status(), err.kind().code(), err.description().to_string())
            }
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Unprocessable { message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable", message)
            }
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{resource} not found."),
            ),
            AppError::Conflict { message } => (StatusCode::CONFLICT, "conflict", message),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_server_error",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            success: false,
            error: status.as_u16(),
            code,
            message,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = www_authenticate {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::conflict("a drink with this title already exists"),
            RepoError::Db(err) => {
                tracing::error!(error = ?err, "database error");
                AppError::Internal
            }
        }
    }
}
