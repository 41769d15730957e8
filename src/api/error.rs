//! API error handling for consistent JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::pipeline::GenerateError;
use crate::session::SessionError;

/// API error type that converts to JSON responses.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": true,
            "kind": self.kind,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        let status = match &err {
            GenerateError::MissingParameter(_) | GenerateError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            GenerateError::Unauthorized => StatusCode::UNAUTHORIZED,
            GenerateError::NotFound => StatusCode::NOT_FOUND,
            // Quota refusals share 403 with ownership failures but keep a
            // distinct kind and upgrade-path message.
            GenerateError::Forbidden | GenerateError::QuotaExceeded => StatusCode::FORBIDDEN,
            GenerateError::Conflict => StatusCode::CONFLICT,
            GenerateError::ModelUnavailable(_) => StatusCode::BAD_GATEWAY,
            GenerateError::ParseError(_) | GenerateError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self::new(status, err.kind(), err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match &err {
            SessionError::InvalidTransition(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let kind = match &err {
            SessionError::PermissionDenied(_) => "permission_denied",
            SessionError::RecognitionUnavailable(_) => "recognition_unavailable",
            SessionError::InvalidTransition(_) => "invalid_transition",
            SessionError::Capture(_) => "capture_failed",
        };

        Self::new(status, kind, err.to_string())
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_error_status_mapping() {
        let cases = [
            (GenerateError::MissingParameter("x"), StatusCode::BAD_REQUEST),
            (GenerateError::Unauthorized, StatusCode::UNAUTHORIZED),
            (GenerateError::NotFound, StatusCode::NOT_FOUND),
            (GenerateError::Forbidden, StatusCode::FORBIDDEN),
            (GenerateError::QuotaExceeded, StatusCode::FORBIDDEN),
            (GenerateError::InvalidInput("short"), StatusCode::BAD_REQUEST),
            (GenerateError::Conflict, StatusCode::CONFLICT),
            (
                GenerateError::ModelUnavailable("down".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                GenerateError::ParseError("bad"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                GenerateError::Persistence("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, expected);
        }
    }

    #[test]
    fn test_quota_message_names_the_upgrade_path() {
        let api: ApiError = GenerateError::QuotaExceeded.into();
        assert_eq!(api.kind, "quota_exceeded");
        assert!(api.message.contains("Upgrade"));
    }
}
