//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod provider;
pub mod tokens;
pub mod webhook;

pub use crate::state::AppState;
pub use health::{health, root, HealthResponse};
pub use provider::{
    get_user_handler, track_handler, validate_handler, TrackRequest, ValidateRequest,
};
pub use tokens::{
    challenge_token_handler, registration_token_handler, ChallengeTokenRequest,
    RegistrationTokenRequest,
};
pub use webhook::{webhook_handler, WebhookEvent};
