//! Challenge and registration token issuance.
//!
//! [`ChallengeOrchestrator::issue_challenge`] runs three provider calls in a
//! fixed order:
//!
//! 1. fetch the user record (fatal on failure)
//! 2. track the sign-in action (fatal on failure)
//! 3. if tracking demands a challenge and the user has a `DEVICE`
//!    authenticator, create a challenge bound to the first one
//!
//! A failed step 3 degrades to the plain tracking result; it never fails the
//! request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{IssuanceError, ProviderError};
use crate::provider::{MfaProvider, ENROLLMENT_ACTION, SIGN_IN_ACTION};
use crate::types::{
    ActionState, Attributes, AuthenticatorDescriptor, DeviceChallengeResult, TrackResult,
    UserRecord,
};

const DEVICE_CHALLENGE_MESSAGE: &str = "Device challenge created successfully";
const CHALLENGE_TOKEN_MESSAGE: &str = "Use this token for challenge authentication";
const REGISTRATION_TOKEN_MESSAGE: &str = "Use this token for device registration";

/// Token (and possibly device challenge) handed to the client for sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ChallengeIssuanceResult {
    pub user_id: String,
    pub token: String,
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "CHALLENGE_REQUIRED"))]
    pub state: ActionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
    /// Present only when a device-bound challenge was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_challenge: Option<DeviceChallengeResult>,
    pub message: String,
}

impl ChallengeIssuanceResult {
    fn plain(user_id: &str, track: TrackResult) -> Self {
        Self {
            user_id: user_id.to_string(),
            token: track.token,
            state: track.state,
            challenge_id: track.challenge_id,
            device_challenge: None,
            message: CHALLENGE_TOKEN_MESSAGE.to_string(),
        }
    }

    fn with_device_challenge(
        user_id: &str,
        track: TrackResult,
        device_challenge: DeviceChallengeResult,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            token: track.token,
            state: track.state,
            challenge_id: Some(device_challenge.challenge_id.clone()),
            device_challenge: Some(device_challenge),
            message: DEVICE_CHALLENGE_MESSAGE.to_string(),
        }
    }
}

/// Token handed to the client so a device can enroll a credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegistrationTokenResult {
    pub user_id: String,
    pub token: String,
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "ALLOW"))]
    pub state: ActionState,
    pub message: String,
}

/// What happened when a device-bound challenge was considered.
#[derive(Debug)]
pub(crate) enum DeviceChallengeOutcome {
    Created(DeviceChallengeResult),
    NotAttempted,
    Failed(ProviderError),
}

/// Id of the authenticator a device challenge should be bound to, if any.
///
/// Only a `CHALLENGE_REQUIRED` tracking state qualifies, and only the first
/// `DEVICE` authenticator in the provider's order is ever chosen.
pub(crate) fn device_challenge_target<'a>(
    user: &'a UserRecord,
    track: &TrackResult,
) -> Option<&'a str> {
    if track.state != ActionState::ChallengeRequired {
        return None;
    }
    user.first_device_authenticator().and_then(AuthenticatorDescriptor::id)
}

/// Issues sign-in challenge and registration tokens against an MFA provider.
pub struct ChallengeOrchestrator<P: ?Sized> {
    provider: Arc<P>,
}

impl<P: ?Sized> Clone for ChallengeOrchestrator<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: MfaProvider + ?Sized> ChallengeOrchestrator<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Issue a sign-in challenge token, upgrading to a device challenge when possible.
    #[instrument(level = "info", skip(self, attributes), fields(user_id = %user_id))]
    pub async fn issue_challenge(
        &self,
        user_id: &str,
        attributes: &Attributes,
    ) -> Result<ChallengeIssuanceResult, IssuanceError> {
        let user = self.provider.get_user(user_id).await.map_err(|e| {
            warn!(error = %e, "User lookup failed");
            IssuanceError::UserLookupFailed(e)
        })?;
        debug!(
            authenticators = user.user_authenticators.len(),
            "Fetched user record"
        );

        let track = self
            .provider
            .track(user_id, SIGN_IN_ACTION, Some(attributes))
            .await
            .map_err(|e| {
                warn!(error = %e, "Action tracking failed");
                IssuanceError::ActionTrackingFailed(e)
            })?;
        info!(state = %track.state, "Tracked sign-in action");

        match self.try_device_challenge(user_id, &user, &track).await {
            DeviceChallengeOutcome::Created(device_challenge) => {
                info!(
                    challenge_id = %device_challenge.challenge_id,
                    "Device challenge created"
                );
                Ok(ChallengeIssuanceResult::with_device_challenge(
                    user_id,
                    track,
                    device_challenge,
                ))
            }
            DeviceChallengeOutcome::Failed(e) => {
                warn!(error = %e, "Device challenge creation failed, using plain token");
                Ok(ChallengeIssuanceResult::plain(user_id, track))
            }
            DeviceChallengeOutcome::NotAttempted => {
                Ok(ChallengeIssuanceResult::plain(user_id, track))
            }
        }
    }

    async fn try_device_challenge(
        &self,
        user_id: &str,
        user: &UserRecord,
        track: &TrackResult,
    ) -> DeviceChallengeOutcome {
        let Some(authenticator_id) = device_challenge_target(user, track) else {
            return DeviceChallengeOutcome::NotAttempted;
        };

        debug!(authenticator_id, "Creating device challenge");
        match self
            .provider
            .create_challenge(user_id, authenticator_id, SIGN_IN_ACTION)
            .await
        {
            Ok(result) => DeviceChallengeOutcome::Created(result),
            Err(e) => DeviceChallengeOutcome::Failed(e),
        }
    }

    /// Issue a token that lets a device enroll a new authenticator.
    #[instrument(level = "info", skip(self), fields(user_id = %user_id))]
    pub async fn issue_registration_token(
        &self,
        user_id: &str,
    ) -> Result<RegistrationTokenResult, IssuanceError> {
        let track = self
            .provider
            .track(user_id, ENROLLMENT_ACTION, None)
            .await
            .map_err(|e| {
                warn!(error = %e, "Enrollment tracking failed");
                IssuanceError::ActionTrackingFailed(e)
            })?;
        info!(state = %track.state, "Tracked enrollment action");

        Ok(RegistrationTokenResult {
            user_id: user_id.to_string(),
            token: track.token,
            state: track.state,
            message: REGISTRATION_TOKEN_MESSAGE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockCall, MockProvider};
    use crate::types::AuthenticatorType;
    use serde_json::json;

    fn device(id: &str) -> AuthenticatorDescriptor {
        AuthenticatorDescriptor::new(id, AuthenticatorType::Device)
    }

    fn other(id: &str, kind: &str) -> AuthenticatorDescriptor {
        AuthenticatorDescriptor::new(id, AuthenticatorType::Other(kind.into()))
    }

    fn phone_attributes() -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("phoneNumber".into(), json!("+1234567890"));
        attributes
    }

    fn orchestrator(mock: MockProvider) -> (ChallengeOrchestrator<MockProvider>, Arc<MockProvider>) {
        let provider = Arc::new(mock);
        (ChallengeOrchestrator::new(Arc::clone(&provider)), provider)
    }

    #[tokio::test]
    async fn test_no_authenticators_challenge_required_returns_plain_token() {
        let (orch, mock) = orchestrator(
            MockProvider::new()
                .with_user(UserRecord::new("u1", vec![]))
                .with_track_result(TrackResult::new("tok", ActionState::ChallengeRequired)),
        );

        let result = orch.issue_challenge("u1", &phone_attributes()).await.unwrap();

        assert_eq!(result.user_id, "u1");
        assert_eq!(result.token, "tok");
        assert_eq!(result.state, ActionState::ChallengeRequired);
        assert!(result.device_challenge.is_none());
        assert_eq!(mock.create_challenge_count(), 0);
    }

    #[tokio::test]
    async fn test_non_device_authenticators_never_upgrade() {
        let (orch, mock) = orchestrator(
            MockProvider::new()
                .with_user(UserRecord::new(
                    "u1",
                    vec![other("p1", "PASSKEY"), other("s1", "SMS")],
                ))
                .with_track_result(TrackResult::new("tok", ActionState::ChallengeRequired)),
        );

        let result = orch.issue_challenge("u1", &Attributes::new()).await.unwrap();

        assert!(result.device_challenge.is_none());
        assert_eq!(mock.create_challenge_count(), 0);
    }

    #[tokio::test]
    async fn test_device_challenge_id_replaces_tracked_challenge_id() {
        let (orch, mock) = orchestrator(
            MockProvider::new()
                .with_user(UserRecord::new("u1", vec![device("A1")]))
                .with_track_result(
                    TrackResult::new("tok", ActionState::ChallengeRequired)
                        .with_challenge_id("tracked"),
                )
                .with_device_challenge(DeviceChallengeResult::new("C1")),
        );

        let result = orch.issue_challenge("u1", &phone_attributes()).await.unwrap();

        assert_eq!(result.token, "tok");
        assert_eq!(result.state, ActionState::ChallengeRequired);
        assert_eq!(result.challenge_id.as_deref(), Some("C1"));
        assert_eq!(
            result.device_challenge.as_ref().map(|d| d.challenge_id.as_str()),
            Some("C1")
        );
        assert_eq!(result.message, DEVICE_CHALLENGE_MESSAGE);
        assert_eq!(
            mock.calls().last(),
            Some(&MockCall::CreateChallenge {
                user_id: "u1".into(),
                authenticator_id: "A1".into(),
                action: SIGN_IN_ACTION.into(),
            })
        );
    }

    #[tokio::test]
    async fn test_device_failure_degrades_to_plain_result() {
        let user = UserRecord::new("u1", vec![device("A1")]);
        let track = TrackResult::new("tok", ActionState::ChallengeRequired).with_challenge_id("T9");

        let (failing, failing_mock) = orchestrator(
            MockProvider::new()
                .with_user(user.clone())
                .with_track_result(track.clone())
                .failing_create_challenge("device offline"),
        );
        let degraded = failing
            .issue_challenge("u1", &phone_attributes())
            .await
            .unwrap();

        assert_eq!(failing_mock.create_challenge_count(), 1);
        assert_eq!(degraded, ChallengeIssuanceResult::plain("u1", track));
        assert_eq!(degraded.challenge_id.as_deref(), Some("T9"));
        assert!(degraded.device_challenge.is_none());
        assert_eq!(degraded.message, CHALLENGE_TOKEN_MESSAGE);
    }

    #[tokio::test]
    async fn test_device_failure_without_tracked_challenge_id() {
        let (orch, _) = orchestrator(
            MockProvider::new()
                .with_user(UserRecord::new("u1", vec![device("A1")]))
                .with_track_result(TrackResult::new("tok", ActionState::ChallengeRequired))
                .failing_create_challenge("boom"),
        );

        let result = orch.issue_challenge("u1", &Attributes::new()).await.unwrap();

        assert!(result.challenge_id.is_none());
        assert!(result.device_challenge.is_none());
        let body = serde_json::to_value(&result).unwrap();
        assert!(body.get("challengeId").is_none());
        assert!(body.get("deviceChallenge").is_none());
    }

    #[tokio::test]
    async fn test_allow_state_makes_no_device_attempt() {
        let (orch, mock) = orchestrator(
            MockProvider::new()
                .with_user(UserRecord::new("u1", vec![device("A1")]))
                .with_track_result(TrackResult::new("tok", ActionState::Allow)),
        );

        let result = orch.issue_challenge("u1", &Attributes::new()).await.unwrap();

        assert_eq!(result.state, ActionState::Allow);
        assert!(result.device_challenge.is_none());
        assert_eq!(mock.create_challenge_count(), 0);
    }

    #[tokio::test]
    async fn test_first_device_authenticator_selected_every_time() {
        let (orch, mock) = orchestrator(
            MockProvider::new()
                .with_user(UserRecord::new(
                    "u1",
                    vec![other("p1", "PASSKEY"), device("D1"), device("D2")],
                ))
                .with_track_result(TrackResult::new("tok", ActionState::ChallengeRequired)),
        );

        for _ in 0..3 {
            orch.issue_challenge("u1", &Attributes::new()).await.unwrap();
        }

        let selected: Vec<_> = mock
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::CreateChallenge {
                    authenticator_id, ..
                } => Some(authenticator_id),
                _ => None,
            })
            .collect();
        assert_eq!(selected, vec!["D1", "D1", "D1"]);
    }

    #[tokio::test]
    async fn test_user_lookup_failure_is_fatal_and_skips_tracking() {
        let (orch, mock) = orchestrator(MockProvider::new().failing_get_user("user service down"));

        let err = orch
            .issue_challenge("u1", &Attributes::new())
            .await
            .unwrap_err();

        assert!(matches!(err, IssuanceError::UserLookupFailed(_)));
        assert_eq!(err.to_string(), "user service down");
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_tracking_failure_is_fatal() {
        let (orch, mock) = orchestrator(
            MockProvider::new()
                .with_user(UserRecord::new("u1", vec![device("A1")]))
                .failing_track("rate limited"),
        );

        let err = orch
            .issue_challenge("u1", &Attributes::new())
            .await
            .unwrap_err();

        assert!(matches!(err, IssuanceError::ActionTrackingFailed(_)));
        assert_eq!(mock.create_challenge_count(), 0);
    }

    #[tokio::test]
    async fn test_attributes_forwarded_verbatim_to_sign_in_tracking() {
        let (orch, mock) = orchestrator(MockProvider::new());
        let mut attributes = phone_attributes();
        attributes.insert("custom".into(), json!({ "nested": [1, 2] }));

        orch.issue_challenge("u1", &attributes).await.unwrap();

        assert_eq!(
            mock.calls()[1],
            MockCall::Track {
                user_id: "u1".into(),
                action: SIGN_IN_ACTION.into(),
                attributes: Some(attributes),
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_state_passes_through() {
        let (orch, _) = orchestrator(
            MockProvider::new()
                .with_user(UserRecord::new("u1", vec![device("A1")]))
                .with_track_result(TrackResult::new(
                    "tok",
                    ActionState::Other("NEW_STATE".into()),
                )),
        );

        let result = orch.issue_challenge("u1", &Attributes::new()).await.unwrap();
        let body = serde_json::to_value(&result).unwrap();
        assert_eq!(body["state"], json!("NEW_STATE"));
    }

    #[tokio::test]
    async fn test_registration_token_tracks_enrollment_without_attributes() {
        let (orch, mock) = orchestrator(
            MockProvider::new().with_track_result(TrackResult::new("reg", ActionState::Allow)),
        );

        let result = orch.issue_registration_token("u7").await.unwrap();

        assert_eq!(result.user_id, "u7");
        assert_eq!(result.token, "reg");
        assert_eq!(result.message, REGISTRATION_TOKEN_MESSAGE);
        assert_eq!(
            mock.calls(),
            vec![MockCall::Track {
                user_id: "u7".into(),
                action: ENROLLMENT_ACTION.into(),
                attributes: None,
            }]
        );
    }

    #[test]
    fn test_device_challenge_target_skips_device_without_id() {
        let mut unnamed = device("ignored");
        unnamed.user_authenticator_id = None;
        let user = UserRecord::new("u1", vec![unnamed, device("A2")]);
        let required = TrackResult::new("t", ActionState::ChallengeRequired);

        assert_eq!(device_challenge_target(&user, &required), Some("A2"));

        let only_unnamed = UserRecord::new("u1", vec![user.user_authenticators[0].clone()]);
        assert!(device_challenge_target(&only_unnamed, &required).is_none());
    }

    #[test]
    fn test_device_challenge_target_requires_challenge_state() {
        let user = UserRecord::new("u1", vec![device("A1")]);
        let required = TrackResult::new("t", ActionState::ChallengeRequired);
        let blocked = TrackResult::new("t", ActionState::Block);

        assert_eq!(
            device_challenge_target(&user, &required),
            Some("A1")
        );
        assert!(device_challenge_target(&user, &blocked).is_none());
    }
}
