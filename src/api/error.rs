//! Unified API error handling.
//!
//! All API endpoints return errors in one JSON shape with an appropriate
//! HTTP status code. Domain errors from the GitHub clients map onto these
//! codes without leaking upstream detail beyond status and message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::github::{ContentsError, GitHubAppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    InternalError,
    ExternalServiceError,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ExternalServiceError => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::BadRequest,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InternalError,
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ExternalServiceError,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<GitHubAppError> for ApiError {
    fn from(err: GitHubAppError) -> Self {
        match err {
            GitHubAppError::Configuration(_) => ApiError::internal(err.to_string()),
            GitHubAppError::InstallationNotFound { .. } | GitHubAppError::TokenExchange { .. } => {
                ApiError::upstream(err.to_string())
            }
            GitHubAppError::Http(_) => ApiError::upstream(err.to_string()),
            GitHubAppError::Jwt(_) => ApiError::internal(err.to_string()),
        }
    }
}

impl From<ContentsError> for ApiError {
    fn from(err: ContentsError) -> Self {
        match err {
            ContentsError::NotFound(path) => ApiError::not_found(format!("file not found: {}", path)),
            ContentsError::Upstream { .. } | ContentsError::Http(_) => {
                ApiError::upstream(err.to_string())
            }
            ContentsError::Decode(_) => ApiError::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_statuses() {
        assert_eq!(ErrorCode::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::ExternalServiceError.status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn contents_not_found_maps_to_404() {
        let err: ApiError = ContentsError::NotFound("stocks/AAPL.json".to_string()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn token_exchange_failure_maps_to_bad_gateway() {
        let err: ApiError = GitHubAppError::TokenExchange {
            status: 401,
            message: "bad credentials".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
        assert!(err.message.contains("401"));
    }
}
