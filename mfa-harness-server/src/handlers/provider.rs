//! Provider pass-through handlers
//!
//! Each endpoint maps 1:1 onto a provider operation and returns the
//! provider's response unchanged.

use axum::{
    extract::{Path, State},
    Json,
};
use mfa_harness_core::{Attributes, TrackResult, UserRecord, ValidationResult};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorResponse};
use crate::handlers::AppState;

/// Request for tracking an action
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    #[serde(default)]
    #[schema(example = "test_user_123")]
    pub user_id: String,
    #[serde(default)]
    #[schema(example = "signIn")]
    pub action: String,
    /// Free-form attributes forwarded verbatim
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<Attributes>,
}

/// Request for validating a challenge token
#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateRequest {
    #[serde(default)]
    pub token: String,
}

/// Track an action and return the provider's token
#[utoipa::path(
    post,
    path = "/api/track",
    tag = "Provider",
    request_body = TrackRequest,
    responses(
        (status = 200, description = "Provider track response", body = TrackResult),
        (status = 500, description = "Provider call failed", body = ErrorResponse)
    )
)]
pub async fn track_handler(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest>,
) -> Result<Json<TrackResult>, ApiError> {
    tracing::info!(
        user_id = %request.user_id,
        action = %request.action,
        "Tracking action"
    );

    let result = state
        .provider
        .track(
            &request.user_id,
            &request.action,
            request.attributes.as_ref(),
        )
        .await
        .map_err(|e| ApiError::upstream("Failed to track action", e))?;

    tracing::debug!(state = %result.state, "Track response");
    Ok(Json(result))
}

/// Validate a challenge token
#[utoipa::path(
    post,
    path = "/api/validate",
    tag = "Provider",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Provider validation response", body = ValidationResult),
        (status = 500, description = "Provider call failed", body = ErrorResponse)
    )
)]
pub async fn validate_handler(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidationResult>, ApiError> {
    tracing::info!("Validating token");

    let result = state
        .provider
        .validate_challenge(&request.token)
        .await
        .map_err(|e| ApiError::upstream("Failed to validate challenge", e))?;

    tracing::debug!(is_valid = ?result.is_valid, "Validation response");
    Ok(Json(result))
}

/// Get user details, including enrolled authenticators
#[utoipa::path(
    get,
    path = "/api/user/{user_id}",
    tag = "Provider",
    params(("user_id" = String, Path, description = "Provider user id")),
    responses(
        (status = 200, description = "Provider user record", body = UserRecord),
        (status = 500, description = "Provider call failed", body = ErrorResponse)
    )
)]
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserRecord>, ApiError> {
    tracing::info!(user_id = %user_id, "Getting user details");

    let user = state
        .provider
        .get_user(&user_id)
        .await
        .map_err(|e| ApiError::upstream("Failed to get user", e))?;

    tracing::debug!(
        authenticators = user.user_authenticators.len(),
        "User response"
    );
    Ok(Json(user))
}
