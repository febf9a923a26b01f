//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document served at `/api-docs/openapi.json`.

use mfa_harness_core::{
    AuthenticatorDescriptor, ChallengeIssuanceResult, DeviceChallengeResult,
    RegistrationTokenResult, TrackResult, UserRecord, ValidationResult,
};
use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers::{
    ChallengeTokenRequest, HealthResponse, RegistrationTokenRequest, TrackRequest,
    ValidateRequest,
};

/// MFA Harness Test Server - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MFA Harness - Test Server",
        version = "0.1.0",
        description = r#"
## Backend test harness for mobile MFA flows

Fronts an Authsignal tenant so a mobile client can exercise:

1. **Enrollment** - `POST /test/registration-token` issues a token for adding a device credential
2. **Sign-in** - `POST /test/challenge-token` issues a challenge token, upgraded to a
   device-bound challenge when the user already has a `DEVICE` authenticator

The `/api/*` endpoints pass straight through to the provider.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Testing", description = "Registration and challenge token issuance"),
        (name = "Provider", description = "Direct pass-through to the MFA provider"),
        (name = "Webhook", description = "Provider event receiver"),
        (name = "Health", description = "Service health")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::provider::track_handler,
        crate::handlers::provider::validate_handler,
        crate::handlers::provider::get_user_handler,
        crate::handlers::tokens::registration_token_handler,
        crate::handlers::tokens::challenge_token_handler,
        crate::handlers::webhook::webhook_handler,
    ),
    components(
        schemas(
            HealthResponse,
            TrackRequest,
            ValidateRequest,
            RegistrationTokenRequest,
            ChallengeTokenRequest,
            RegistrationTokenResult,
            ChallengeIssuanceResult,
            DeviceChallengeResult,
            TrackResult,
            ValidationResult,
            UserRecord,
            AuthenticatorDescriptor,
            ErrorResponse,
        )
    )
)]
pub struct ApiDoc;
