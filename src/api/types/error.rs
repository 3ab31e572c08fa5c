//! JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, RelayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    AuthenticationError,
    PermissionError,
    NotFoundError,
    ConflictError,
    UpstreamError,
    ServerError,
    ServiceUnavailableError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::AuthenticationError => write!(f, "authentication_error"),
            Self::PermissionError => write!(f, "permission_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ConflictError => write!(f, "conflict_error"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::ServerError => write!(f, "server_error"),
            Self::ServiceUnavailableError => write!(f, "service_unavailable_error"),
        }
    }
}

/// Body: `{"error": {"message", "type", "code"?}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    code: None,
                },
            },
        }
    }

    /// Machine-readable code for clients that branch on the failure
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiErrorType::AuthenticationError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ApiErrorType::PermissionError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    /// Lost an optimistic-concurrency race; the client may retry
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ApiErrorType::ConflictError, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, ApiErrorType::UpstreamError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServiceUnavailableError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::WriteConflict { message } => {
                Self::conflict(message).with_code("write_conflict")
            }
            DomainError::BackendUnavailable { message } => {
                Self::unavailable(message).with_code("backend_unavailable")
            }
            DomainError::MalformedDocument { message }
            | DomainError::Configuration { message }
            | DomainError::Internal { message } => Self::internal(message),
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        if err.is_recipient_misconfigured() {
            Self::bad_request(err.to_string()).with_code("recipient_misconfigured")
        } else {
            Self::bad_gateway(err.to_string())
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_statuses() {
        let cases = [
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::write_conflict("x"), StatusCode::CONFLICT),
            (DomainError::backend_unavailable("x"), StatusCode::SERVICE_UNAVAILABLE),
            (DomainError::malformed_document("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::configuration("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_conflict_carries_code() {
        let err = ApiError::from(DomainError::write_conflict("stale version"));

        assert_eq!(err.response.error.error_type, ApiErrorType::ConflictError);
        assert_eq!(err.response.error.code.as_deref(), Some("write_conflict"));
        assert_eq!(err.response.error.message, "stale version");
    }

    #[test]
    fn test_relay_error_statuses() {
        let misconfigured = ApiError::from(RelayError::rejected("Bad Request: chat not found"));
        assert_eq!(misconfigured.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            misconfigured.response.error.code.as_deref(),
            Some("recipient_misconfigured")
        );

        let unauthorized_bot = ApiError::from(RelayError::rejected("Unauthorized: invalid bot token"));
        assert_eq!(unauthorized_bot.status, StatusCode::BAD_REQUEST);

        let other = ApiError::from(RelayError::rejected("Too Many Requests: retry after 5"));
        assert_eq!(other.status, StatusCode::BAD_GATEWAY);

        let transport = ApiError::from(RelayError::transport("timed out"));
        assert_eq!(transport.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::unauthorized("Invalid credentials");
        let json = serde_json::to_value(&err.response).unwrap();

        assert_eq!(json["error"]["type"], "authentication_error");
        assert_eq!(json["error"]["message"], "Invalid credentials");
        assert!(json["error"].get("code").is_none());
    }
}
