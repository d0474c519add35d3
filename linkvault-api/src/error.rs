/// Error handling for the API server
///
/// Handlers return `Result<T, ApiError>`. Session outcomes convert through
/// `From<SessionError>`, so a handler can use `?` directly on a
/// [`SessionService`](linkvault_shared::session::SessionService) call.
///
/// Every error renders as:
///
/// ```json
/// { "error": "unauthorized", "message": "Invalid credentials" }
/// ```
///
/// with an additional `details` array for validation failures.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use linkvault_shared::session::{FieldError, SessionError};
use serde::Serialize;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400) with per-field details
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    /// Unauthorized (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict (409), e.g. duplicate email
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Too many requests (429)
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded { retry_after: u64, message: String },

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Service unavailable (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "validation_error", "unauthorized")
    pub error: &'static str,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            ApiError::InternalError(_) => "internal_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.code();
        let retry_after = match &self {
            ApiError::RateLimitExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        };

        let (message, details) = match self {
            ApiError::Validation(fields) => ("Request validation failed".to_string(), Some(fields)),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %msg, "Internal error");
                ("An internal error occurred".to_string(), None)
            }
            ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::RateLimitExceeded { message: msg, .. } => (msg, None),
        };

        let body = Json(ErrorResponse {
            error,
            message,
            details,
        });

        let mut response = (status, body).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(fields) => ApiError::Validation(fields),
            SessionError::Unauthorized => ApiError::Unauthorized("Invalid credentials".to_string()),
            SessionError::Conflict(msg) => ApiError::Conflict(msg),
            SessionError::NotFound(msg) => ApiError::NotFound(msg),
            SessionError::Cancelled => {
                ApiError::ServiceUnavailable("The request was cancelled".to_string())
            }
            // Already logged where it was wrapped
            SessionError::Internal => ApiError::InternalError("session operation failed".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");

        let err = ApiError::Validation(vec![FieldError {
            field: "email".to_string(),
            message: "Email must be a valid email address".to_string(),
        }]);
        assert_eq!(err.to_string(), "Validation failed: 1 errors");
    }

    #[test]
    fn test_session_error_status_mapping() {
        let cases = [
            (SessionError::Validation(vec![]), StatusCode::BAD_REQUEST),
            (SessionError::Unauthorized, StatusCode::UNAUTHORIZED),
            (SessionError::Conflict("taken".into()), StatusCode::CONFLICT),
            (SessionError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (SessionError::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
            (SessionError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (session_error, status) in cases {
            assert_eq!(ApiError::from(session_error).status(), status);
        }
    }

    #[tokio::test]
    async fn test_validation_body_has_details() {
        let response = ApiError::Validation(vec![FieldError {
            field: "password".to_string(),
            message: "Password must be at least 8 characters".to_string(),
        }])
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "password");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::InternalError("connection refused".to_string()).into_response();

        let body = body_json(response).await;
        assert_eq!(body["message"], "An internal error occurred");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_sets_retry_after() {
        let response = ApiError::RateLimitExceeded {
            retry_after: 42,
            message: "Too many login attempts".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }
}
