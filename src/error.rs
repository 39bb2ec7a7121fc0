// src/error.rs

use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (malformed input, broken JSON, bad parameters)
    BadRequest(String),

    // 400 Bad Request carrying aggregated field-constraint failures
    Validation(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden (self-action, non-owner access, disabled account)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (duplicate email/nickname/rating/follow/folder name)
    Conflict(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InternalServerError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::AuthError(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// JSON body of every error response: `{status, error, message, path}`.
///
/// `path` is unknown at the point where the error is converted into a
/// response; [`attach_request_path`] fills it in from the request URI.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

/// Implements `IntoResponse` for `AppError`.
///
/// Converts the error into the uniform JSON envelope and stashes a copy of
/// the body in the response extensions so the path middleware can rewrite it.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::BadRequest(msg)
            | AppError::Validation(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg,
        };

        let body = ErrorBody {
            status: status.as_u16(),
            error: code.to_string(),
            message,
            path: String::new(),
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Axum Middleware: fills the `path` field of error envelopes.
///
/// `IntoResponse` has no access to the request URI, so error responses carry
/// their body in an extension; this middleware rebuilds them with the path of
/// the request that failed. Must sit inside all layers that add headers.
pub async fn attach_request_path(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;

    if let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() {
        body.path = path;
        return (response.status(), Json(body)).into_response();
    }

    response
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Converts aggregated `validator` failures into a single 400 message.
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Returns the violated constraint name when `err` is a Postgres unique
/// violation (SQLSTATE 23505), `None` for every other error.
///
/// Handlers use this to turn concurrent duplicate inserts into 409s instead
/// of 500s, and to report which field collided.
pub fn unique_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            Some(db_err.constraint().unwrap_or("unique constraint").to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_maps_to_404_envelope() {
        let (status, body) = body_of(AppError::NotFound("Prompt not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "NOT_FOUND");
        assert_eq!(body["message"], "Prompt not found");
        assert_eq!(body["path"], "");
    }

    #[tokio::test]
    async fn conflict_maps_to_409() {
        let (status, body) = body_of(AppError::Conflict("dup".to_string())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "CONFLICT");
    }

    #[tokio::test]
    async fn forbidden_maps_to_403() {
        let (status, body) = body_of(AppError::Forbidden("no".to_string())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_own_code() {
        let (status, body) = body_of(AppError::Validation("title: too long".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn internal_error_hides_cause() {
        let (status, body) =
            body_of(AppError::InternalServerError("connection refused".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn unique_constraint_ignores_other_errors() {
        assert_eq!(unique_constraint(&sqlx::Error::RowNotFound), None);
    }
}
