//! Authsignal webhook receiver
//!
//! Logs the event and acknowledges it. Payloads are never rejected: anything
//! that does not parse as a known event is logged as unknown.

use axum::{body::Bytes, http::StatusCode};
use serde::Deserialize;
use serde_json::Value;

/// Webhook envelope: `{ "type": ..., "data": { ... } }`
#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: Option<ChallengeData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChallengeData {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    challenge_id: Option<String>,
}

/// A webhook event the harness knows how to describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    DeviceChallenge {
        user_id: Option<String>,
        challenge_id: Option<String>,
    },
    PushChallenge {
        user_id: Option<String>,
        challenge_id: Option<String>,
    },
    Unknown(Option<String>),
}

impl WebhookEvent {
    /// Classify a raw webhook body.
    pub fn parse(body: &[u8]) -> Self {
        let payload: WebhookPayload = serde_json::from_slice(body).unwrap_or_default();
        let data = payload.data.unwrap_or_default();

        match payload.kind.as_deref() {
            Some("deviceChallenge") => Self::DeviceChallenge {
                user_id: data.user_id,
                challenge_id: data.challenge_id,
            },
            Some("pushChallenge") => Self::PushChallenge {
                user_id: data.user_id,
                challenge_id: data.challenge_id,
            },
            _ => Self::Unknown(payload.kind),
        }
    }

    fn log(&self) {
        match self {
            Self::DeviceChallenge {
                user_id,
                challenge_id,
            } => tracing::info!(
                user_id = user_id.as_deref().unwrap_or("unknown"),
                challenge_id = challenge_id.as_deref().unwrap_or("unknown"),
                "Device challenge created"
            ),
            Self::PushChallenge {
                user_id,
                challenge_id,
            } => tracing::info!(
                user_id = user_id.as_deref().unwrap_or("unknown"),
                challenge_id = challenge_id.as_deref().unwrap_or("unknown"),
                "Push challenge created"
            ),
            Self::Unknown(kind) => tracing::warn!(
                kind = kind.as_deref().unwrap_or("missing"),
                "Unknown webhook type"
            ),
        }
    }
}

/// Webhook endpoint for Authsignal events
#[utoipa::path(
    post,
    path = "/webhook/authsignal",
    tag = "Webhook",
    responses(
        (status = 200, description = "Event acknowledged", body = String)
    )
)]
pub async fn webhook_handler(body: Bytes) -> (StatusCode, &'static str) {
    match serde_json::from_slice::<Value>(&body) {
        Ok(raw) => tracing::debug!(payload = %raw, "Webhook received"),
        Err(e) => tracing::warn!(error = %e, "Webhook body is not valid JSON"),
    }

    WebhookEvent::parse(&body).log();
    (StatusCode::OK, "OK")
}
