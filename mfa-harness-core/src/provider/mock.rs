//! Scripted MFA provider for testing.
//!
//! Returns canned responses, can be told to fail any single operation, and
//! records every call so tests can assert which remote calls were made.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::MfaProvider;
use crate::error::{ProviderError, Result};
use crate::types::{
    ActionState, Attributes, DeviceChallengeResult, TrackResult, UserRecord, ValidationResult,
};

/// A call received by [`MockProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    GetUser {
        user_id: String,
    },
    Track {
        user_id: String,
        action: String,
        attributes: Option<Attributes>,
    },
    CreateChallenge {
        user_id: String,
        authenticator_id: String,
        action: String,
    },
    ValidateChallenge {
        token: String,
    },
}

/// Mock MFA provider.
/// WARNING: Do not use in production - every token it hands out is fake!
pub struct MockProvider {
    user: Option<UserRecord>,
    track_result: TrackResult,
    device_challenge: DeviceChallengeResult,
    validation: ValidationResult,
    fail_get_user: Option<String>,
    fail_track: Option<String>,
    fail_create_challenge: Option<String>,
    fail_validate: Option<String>,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// A provider whose users have no authenticators and whose actions are allowed.
    pub fn new() -> Self {
        Self {
            user: None,
            track_result: TrackResult::new("mock-token", ActionState::Allow),
            device_challenge: DeviceChallengeResult::new("mock-challenge"),
            validation: ValidationResult {
                is_valid: Some(true),
                state: Some(ActionState::ChallengeSucceeded),
                ..Default::default()
            },
            fail_get_user: None,
            fail_track: None,
            fail_create_challenge: None,
            fail_validate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Return this record from every user lookup.
    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_track_result(mut self, result: TrackResult) -> Self {
        self.track_result = result;
        self
    }

    pub fn with_device_challenge(mut self, result: DeviceChallengeResult) -> Self {
        self.device_challenge = result;
        self
    }

    pub fn with_validation(mut self, result: ValidationResult) -> Self {
        self.validation = result;
        self
    }

    pub fn failing_get_user(mut self, message: impl Into<String>) -> Self {
        self.fail_get_user = Some(message.into());
        self
    }

    pub fn failing_track(mut self, message: impl Into<String>) -> Self {
        self.fail_track = Some(message.into());
        self
    }

    pub fn failing_create_challenge(mut self, message: impl Into<String>) -> Self {
        self.fail_create_challenge = Some(message.into());
        self
    }

    pub fn failing_validate(mut self, message: impl Into<String>) -> Self {
        self.fail_validate = Some(message.into());
        self
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock_calls().clone()
    }

    /// Number of device challenges requested so far.
    pub fn create_challenge_count(&self) -> usize {
        self.lock_calls()
            .iter()
            .filter(|c| matches!(c, MockCall::CreateChallenge { .. }))
            .count()
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: MockCall) {
        self.lock_calls().push(call);
    }
}

fn fail_if(script: &Option<String>) -> Result<()> {
    match script {
        Some(message) => Err(ProviderError::Mock(message.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl MfaProvider for MockProvider {
    async fn get_user(&self, user_id: &str) -> Result<UserRecord> {
        self.record(MockCall::GetUser {
            user_id: user_id.to_string(),
        });
        fail_if(&self.fail_get_user)?;
        Ok(self
            .user
            .clone()
            .unwrap_or_else(|| UserRecord::new(user_id, Vec::new())))
    }

    async fn track(
        &self,
        user_id: &str,
        action: &str,
        attributes: Option<&Attributes>,
    ) -> Result<TrackResult> {
        self.record(MockCall::Track {
            user_id: user_id.to_string(),
            action: action.to_string(),
            attributes: attributes.cloned(),
        });
        fail_if(&self.fail_track)?;
        Ok(self.track_result.clone())
    }

    async fn create_challenge(
        &self,
        user_id: &str,
        authenticator_id: &str,
        action: &str,
    ) -> Result<DeviceChallengeResult> {
        self.record(MockCall::CreateChallenge {
            user_id: user_id.to_string(),
            authenticator_id: authenticator_id.to_string(),
            action: action.to_string(),
        });
        fail_if(&self.fail_create_challenge)?;
        Ok(self.device_challenge.clone())
    }

    async fn validate_challenge(&self, token: &str) -> Result<ValidationResult> {
        self.record(MockCall::ValidateChallenge {
            token: token.to_string(),
        });
        fail_if(&self.fail_validate)?;
        Ok(self.validation.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let mock = MockProvider::new();
        mock.get_user("u1").await.unwrap();
        mock.track("u1", "signIn", None).await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                MockCall::GetUser {
                    user_id: "u1".into()
                },
                MockCall::Track {
                    user_id: "u1".into(),
                    action: "signIn".into(),
                    attributes: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_default_user_echoes_id() {
        let mock = MockProvider::new();
        let user = mock.get_user("someone").await.unwrap();
        assert_eq!(user.user_id, "someone");
        assert!(user.user_authenticators.is_empty());
    }

    #[tokio::test]
    async fn test_mock_failure_still_records_call() {
        let mock = MockProvider::new().failing_validate("token expired");
        let err = mock.validate_challenge("t").await.unwrap_err();
        assert_eq!(err.to_string(), "token expired");
        assert_eq!(mock.calls().len(), 1);
    }
}
