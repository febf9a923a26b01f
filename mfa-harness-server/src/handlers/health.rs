//! Health check and usage handlers

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::handlers::AppState;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "OK" while the process is serving
    #[schema(example = "OK")]
    pub status: &'static str,
    /// Current server time (RFC 3339)
    #[schema(example = "2024-01-01T00:00:00.000Z")]
    pub timestamp: String,
    /// Provider tenant the harness is configured for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Server version from Cargo.toml
    pub version: &'static str,
}

/// GET /health - Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        tenant: state.tenant_id.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET / - Usage instructions
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "MFA Harness Test Server",
        "endpoints": {
            "POST /api/track": "Track an action and get token",
            "POST /api/validate": "Validate a challenge token",
            "GET /api/user/{userId}": "Get user details",
            "POST /webhook/authsignal": "Webhook for Authsignal events",
            "POST /test/registration-token": "Get registration token for testing",
            "POST /test/challenge-token": "Get challenge token for testing",
            "GET /health": "Health check",
            "GET /docs": "OpenAPI documentation"
        },
        "examples": {
            "registrationToken": {
                "url": "POST /test/registration-token",
                "body": { "userId": "test_user_123" }
            },
            "challengeToken": {
                "url": "POST /test/challenge-token",
                "body": { "userId": "test_user_123", "phoneNumber": "+1234567890" }
            }
        }
    }))
}
