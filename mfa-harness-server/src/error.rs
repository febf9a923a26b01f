//! API error handling module
//!
//! Maps provider and issuance failures onto the harness's HTTP error bodies:
//! pass-through endpoints answer `{error, details}`, token endpoints answer
//! `{error}`. Provider and issuance failures are 500s; nothing is retried.
//! An unreadable request body is a 400.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mfa_harness_core::{IssuanceError, ProviderError};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// What failed
    #[schema(example = "Failed to track action")]
    pub error: String,
    /// Underlying provider message (pass-through endpoints only)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "User not found")]
    pub details: Option<String>,
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// A pass-through call to the provider failed
    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: ProviderError,
    },

    /// Token issuance failed
    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    /// Request body could not be read
    #[error("Invalid request body: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// Wrap a provider failure from a pass-through endpoint
    pub fn upstream(context: &'static str, source: ProviderError) -> Self {
        Self::Upstream { context, source }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } | Self::Issuance(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::Upstream { .. } => "upstream",
            Self::Issuance(IssuanceError::UserLookupFailed(_)) => "user_lookup",
            Self::Issuance(IssuanceError::ActionTrackingFailed(_)) => "action_tracking",
            Self::BadRequest(_) => "bad_request",
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::Upstream { context, source } => ErrorResponse {
                error: (*context).to_string(),
                details: Some(source.to_string()),
            },
            Self::Issuance(e) => ErrorResponse {
                error: e.to_string(),
                details: None,
            },
            Self::BadRequest(_) => ErrorResponse {
                error: self.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = self.error_category(),
                error = %self,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = self.error_category(),
                error = %self,
                "Request rejected"
            );
        }

        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_body_has_details() {
        let err = ApiError::upstream(
            "Failed to get user",
            ProviderError::Status {
                status: 404,
                message: "User not found".into(),
            },
        );
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "Failed to get user");
        assert_eq!(body["details"], "Provider returned 404: User not found");
    }

    #[test]
    fn test_issuance_body_has_only_error() {
        let err = ApiError::from(IssuanceError::ActionTrackingFailed(ProviderError::Mock(
            "rate limited".into(),
        )));
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "rate limited" }));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bad_request_is_400_with_error_only() {
        let err = ApiError::bad_request("expected value at line 1 column 1");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "error": "Invalid request body: expected value at line 1 column 1" })
        );
    }
}
