//! Wire types exchanged with the MFA provider.
//!
//! Every record keeps unknown provider fields in a flattened `extra` map so
//! pass-through endpoints can hand the provider's response back verbatim.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Free-form contextual attributes forwarded verbatim to action tracking.
pub type Attributes = Map<String, Value>;

/// Outcome state reported by action tracking.
///
/// Unknown states round-trip as [`ActionState::Other`] so they pass through
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionState {
    Allow,
    Block,
    ChallengeRequired,
    ReviewRequired,
    ChallengeSucceeded,
    ChallengeFailed,
    Other(String),
}

impl ActionState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Allow => "ALLOW",
            Self::Block => "BLOCK",
            Self::ChallengeRequired => "CHALLENGE_REQUIRED",
            Self::ReviewRequired => "REVIEW_REQUIRED",
            Self::ChallengeSucceeded => "CHALLENGE_SUCCEEDED",
            Self::ChallengeFailed => "CHALLENGE_FAILED",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for ActionState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "ALLOW" => Self::Allow,
            "BLOCK" => Self::Block,
            "CHALLENGE_REQUIRED" => Self::ChallengeRequired,
            "REVIEW_REQUIRED" => Self::ReviewRequired,
            "CHALLENGE_SUCCEEDED" => Self::ChallengeSucceeded,
            "CHALLENGE_FAILED" => Self::ChallengeFailed,
            _ => Self::Other(raw),
        }
    }
}

impl From<ActionState> for String {
    fn from(state: ActionState) -> Self {
        match state {
            ActionState::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of an enrolled authenticator. Only `DEVICE` drives any decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthenticatorType {
    Device,
    Other(String),
}

impl From<String> for AuthenticatorType {
    fn from(raw: String) -> Self {
        if raw == "DEVICE" {
            Self::Device
        } else {
            Self::Other(raw)
        }
    }
}

impl From<AuthenticatorType> for String {
    fn from(kind: AuthenticatorType) -> Self {
        match kind {
            AuthenticatorType::Device => "DEVICE".to_string(),
            AuthenticatorType::Other(raw) => raw,
        }
    }
}

/// An enrolled credential as listed on the user record.
///
/// Both fields are optional: entries of other types are opaque and may not
/// carry an id at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_authenticator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "utoipa", schema(value_type = Option<String>, example = "DEVICE"))]
    pub user_authenticator_type: Option<AuthenticatorType>,
    #[serde(flatten)]
    #[cfg_attr(feature = "utoipa", schema(ignore))]
    pub extra: Map<String, Value>,
}

impl AuthenticatorDescriptor {
    pub fn new(id: impl Into<String>, kind: AuthenticatorType) -> Self {
        Self {
            user_authenticator_id: Some(id.into()),
            user_authenticator_type: Some(kind),
            extra: Map::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.user_authenticator_id.as_deref()
    }

    pub fn is_device(&self) -> bool {
        self.user_authenticator_type == Some(AuthenticatorType::Device)
    }
}

/// User record as returned by the provider's user lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub user_id: String,
    /// A `null` list reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_authenticators: Vec<AuthenticatorDescriptor>,
    #[serde(flatten)]
    #[cfg_attr(feature = "utoipa", schema(ignore))]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn new(user_id: impl Into<String>, authenticators: Vec<AuthenticatorDescriptor>) -> Self {
        Self {
            user_id: user_id.into(),
            user_authenticators: authenticators,
            extra: Map::new(),
        }
    }

    /// First `DEVICE` authenticator with an id, in the order the provider
    /// returned them.
    pub fn first_device_authenticator(&self) -> Option<&AuthenticatorDescriptor> {
        self.user_authenticators
            .iter()
            .find(|a| a.is_device() && a.id().is_some())
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result of tracking an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TrackResult {
    pub token: String,
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "CHALLENGE_REQUIRED"))]
    pub state: ActionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "utoipa", schema(ignore))]
    pub extra: Map<String, Value>,
}

impl TrackResult {
    pub fn new(token: impl Into<String>, state: ActionState) -> Self {
        Self {
            token: token.into(),
            state,
            challenge_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_challenge_id(mut self, challenge_id: impl Into<String>) -> Self {
        self.challenge_id = Some(challenge_id.into());
        self
    }
}

/// Device challenge created against an enrolled device authenticator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DeviceChallengeResult {
    pub challenge_id: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "utoipa", schema(ignore))]
    pub extra: Map<String, Value>,
}

impl DeviceChallengeResult {
    pub fn new(challenge_id: impl Into<String>) -> Self {
        Self {
            challenge_id: challenge_id.into(),
            extra: Map::new(),
        }
    }
}

/// Result of validating a challenge token.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "utoipa", schema(value_type = Option<String>, example = "CHALLENGE_SUCCEEDED"))]
    pub state: Option<ActionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "utoipa", schema(ignore))]
    pub extra: Map<String, Value>,
}
