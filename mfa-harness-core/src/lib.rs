//! MFA Harness Core - challenge issuance against an external MFA provider
//!
//! This crate holds everything the test harness knows about the MFA provider:
//!
//! - The [`MfaProvider`] contract (user lookup, action tracking, device
//!   challenge creation, challenge validation)
//! - [`AuthsignalClient`], the HTTP implementation of that contract
//! - [`MockProvider`], a scripted implementation for tests
//! - [`ChallengeOrchestrator`], which decides between a plain challenge token
//!   and a device-bound challenge
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mfa_harness_core::{Attributes, ChallengeOrchestrator, MockProvider};
//!
//! # async fn example() -> Result<(), mfa_harness_core::IssuanceError> {
//! let orchestrator = ChallengeOrchestrator::new(Arc::new(MockProvider::new()));
//! let result = orchestrator
//!     .issue_challenge("test_user_123", &Attributes::new())
//!     .await?;
//! println!("token: {}", result.token);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod types;

pub use error::{IssuanceError, ProviderError, Result};
pub use orchestrator::{ChallengeIssuanceResult, ChallengeOrchestrator, RegistrationTokenResult};
pub use provider::{
    AuthsignalClient, AuthsignalConfig, MfaProvider, MockCall, MockProvider, DEFAULT_BASE_URL,
    ENROLLMENT_ACTION, SIGN_IN_ACTION,
};
pub use types::{
    ActionState, Attributes, AuthenticatorDescriptor, AuthenticatorType, DeviceChallengeResult,
    TrackResult, UserRecord, ValidationResult,
};
