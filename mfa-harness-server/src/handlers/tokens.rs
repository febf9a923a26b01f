//! Test token handlers
//!
//! Entry points a mobile client uses to obtain registration and sign-in
//! challenge tokens.
//!
//! Bodies are read leniently: a missing or empty body counts as `{}` and the
//! `Content-Type` header is not required.

use axum::{body::Bytes, extract::State, Json};
use mfa_harness_core::{Attributes, ChallengeIssuanceResult, RegistrationTokenResult};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorResponse};
use crate::handlers::AppState;

/// Request for a registration token
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationTokenRequest {
    /// User to enroll; a throwaway test user is generated when missing
    #[serde(default)]
    #[schema(example = "test_user_123")]
    pub user_id: Option<String>,
}

/// Request for a sign-in challenge token
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeTokenRequest {
    #[serde(default)]
    #[schema(example = "test_user_123")]
    pub user_id: String,
    #[serde(default)]
    #[schema(example = "+1234567890")]
    pub phone_number: Option<String>,
}

impl ChallengeTokenRequest {
    /// Contextual attributes sent along with the sign-in action.
    pub fn attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        if let Some(phone) = &self.phone_number {
            attributes.insert("phoneNumber".to_string(), Value::String(phone.clone()));
        }
        attributes
    }
}

fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(e.to_string()))
}

fn generated_user_id() -> String {
    format!("test_user_{}", chrono::Utc::now().timestamp_millis())
}

/// Create a registration token for device credentials
#[utoipa::path(
    post,
    path = "/test/registration-token",
    tag = "Testing",
    request_body = RegistrationTokenRequest,
    responses(
        (status = 200, description = "Registration token issued", body = RegistrationTokenResult),
        (status = 400, description = "Body is not valid JSON", body = ErrorResponse),
        (status = 500, description = "Tracking failed", body = ErrorResponse)
    )
)]
pub async fn registration_token_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RegistrationTokenResult>, ApiError> {
    let request: RegistrationTokenRequest = parse_body(&body)?;
    let user_id = request
        .user_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(generated_user_id);

    let result = state.orchestrator.issue_registration_token(&user_id).await?;
    Ok(Json(result))
}

/// Create a challenge token for authentication
///
/// When the provider requires a challenge and the user has an enrolled
/// device authenticator, a device-bound challenge is created as well.
#[utoipa::path(
    post,
    path = "/test/challenge-token",
    tag = "Testing",
    request_body = ChallengeTokenRequest,
    responses(
        (status = 200, description = "Challenge token issued, possibly with a device challenge", body = ChallengeIssuanceResult),
        (status = 400, description = "Body is not valid JSON", body = ErrorResponse),
        (status = 500, description = "User lookup or tracking failed", body = ErrorResponse)
    )
)]
pub async fn challenge_token_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChallengeIssuanceResult>, ApiError> {
    let request: ChallengeTokenRequest = parse_body(&body)?;
    tracing::info!(user_id = %request.user_id, "Creating challenge");

    let result = state
        .orchestrator
        .issue_challenge(&request.user_id, &request.attributes())
        .await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_only_include_present_phone() {
        let with_phone = ChallengeTokenRequest {
            user_id: "u1".into(),
            phone_number: Some("+1234567890".into()),
        };
        assert_eq!(with_phone.attributes()["phoneNumber"], "+1234567890");

        let without_phone = ChallengeTokenRequest {
            user_id: "u1".into(),
            phone_number: None,
        };
        assert!(without_phone.attributes().is_empty());
    }

    #[test]
    fn test_parse_body_treats_empty_as_default() {
        let request: RegistrationTokenRequest = parse_body(b"").unwrap();
        assert!(request.user_id.is_none());

        let request: ChallengeTokenRequest = parse_body(b"  \n").unwrap();
        assert!(request.user_id.is_empty());
        assert!(request.phone_number.is_none());
    }

    #[test]
    fn test_parse_body_rejects_malformed_json() {
        let err = parse_body::<ChallengeTokenRequest>(b"{\"userId\":").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let err = parse_body::<RegistrationTokenRequest>(br#"{"userId":42}"#).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_generated_user_id_prefix() {
        let id = generated_user_id();
        assert!(id.starts_with("test_user_"));
        assert!(id["test_user_".len()..].parse::<i64>().is_ok());
    }
}
