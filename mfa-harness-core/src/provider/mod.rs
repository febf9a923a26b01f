//! MFA provider contract.
//!
//! The harness never decides anything about risk or validity itself; it
//! composes the four remote operations below. Two implementations ship with
//! the crate:
//!
//! - [`AuthsignalClient`] - HTTP client for the Authsignal server API
//! - [`MockProvider`] - scripted in-memory provider for tests and offline runs

mod authsignal;
mod mock;

pub use authsignal::{AuthsignalClient, AuthsignalConfig, DEFAULT_BASE_URL};
pub use mock::{MockCall, MockProvider};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Attributes, DeviceChallengeResult, TrackResult, UserRecord, ValidationResult};

/// Action tracked when a user signs in.
pub const SIGN_IN_ACTION: &str = "signIn";

/// Action tracked when a device enrolls a new authenticator.
pub const ENROLLMENT_ACTION: &str = "addAuthenticator";

/// Remote operations offered by the MFA provider.
///
/// Implementations must be thread-safe (`Send + Sync`). None of the methods
/// retry; a failed call is reported once.
#[async_trait]
pub trait MfaProvider: Send + Sync {
    /// Fetch the current user record, including enrolled authenticators.
    async fn get_user(&self, user_id: &str) -> Result<UserRecord>;

    /// Evaluate a named action for a user.
    async fn track(
        &self,
        user_id: &str,
        action: &str,
        attributes: Option<&Attributes>,
    ) -> Result<TrackResult>;

    /// Create a challenge bound to one enrolled authenticator.
    async fn create_challenge(
        &self,
        user_id: &str,
        authenticator_id: &str,
        action: &str,
    ) -> Result<DeviceChallengeResult>;

    /// Validate a token returned after a completed challenge.
    async fn validate_challenge(&self, token: &str) -> Result<ValidationResult>;
}
