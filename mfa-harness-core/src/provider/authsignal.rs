//! Authsignal server API client.
//!
//! Talks to the Authsignal REST API (v1) with HTTP Basic auth, using the
//! tenant's API secret as the username and an empty password.
//!
//! ## Endpoints
//!
//! - `GET  {base}/users/{userId}`
//! - `POST {base}/users/{userId}/actions/{action}` (body: attributes)
//! - `POST {base}/challenge`
//! - `POST {base}/validate`
//!
//! Calls are made exactly once. Transport timeouts come from
//! [`AuthsignalConfig::timeout`]; there is no retry layer.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;
use zeroize::Zeroizing;

use super::MfaProvider;
use crate::error::{ProviderError, Result};
use crate::types::{Attributes, DeviceChallengeResult, TrackResult, UserRecord, ValidationResult};

/// Default Authsignal API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.authsignal.com/v1";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Authsignal client.
#[derive(Clone)]
pub struct AuthsignalConfig {
    /// API base URL, including the version segment.
    pub base_url: String,
    /// Tenant API secret. Wiped from memory on drop.
    pub api_secret: Zeroizing<String>,
    /// Tenant identifier, informational only.
    pub tenant_id: Option<String>,
    /// Per-request transport timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for AuthsignalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthsignalConfig")
            .field("base_url", &self.base_url)
            .field("api_secret", &"[REDACTED]")
            .field("tenant_id", &self.tenant_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AuthsignalConfig {
    pub fn new(api_secret: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_secret: Zeroizing::new(api_secret.into()),
            tenant_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Required: `AUTHSIGNAL_SECRET`
    /// Optional: `AUTHSIGNAL_BASE_URL`, `AUTHSIGNAL_TENANT_ID`, `AUTHSIGNAL_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let api_secret = std::env::var("AUTHSIGNAL_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ProviderError::Config("AUTHSIGNAL_SECRET environment variable not set".into())
            })?;

        let base_url =
            std::env::var("AUTHSIGNAL_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let tenant_id = std::env::var("AUTHSIGNAL_TENANT_ID")
            .ok()
            .filter(|s| !s.is_empty());

        let timeout = std::env::var("AUTHSIGNAL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(Self {
            base_url,
            api_secret: Zeroizing::new(api_secret),
            tenant_id,
            timeout,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateChallengeRequest<'a> {
    user_id: &'a str,
    user_authenticator_id: &'a str,
    action: &'a str,
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    token: &'a str,
}

/// HTTP client for the Authsignal server API.
pub struct AuthsignalClient {
    client: Client,
    base_url: Url,
    api_secret: Zeroizing<String>,
}

impl AuthsignalClient {
    /// Create a client from configuration.
    #[instrument(level = "debug", skip_all, fields(
        base_url = %config.base_url,
        timeout_ms = config.timeout.as_millis() as u64
    ))]
    pub fn new(config: AuthsignalConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to create HTTP client");
                ProviderError::Config(format!("Failed to create HTTP client: {e}"))
            })?;

        info!("Authsignal client created");
        Ok(Self {
            client,
            base_url,
            api_secret: config.api_secret,
        })
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<T> {
        let start = Instant::now();

        let response = request
            .basic_auth(self.api_secret.as_str(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    operation,
                    error = %e,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Provider request failed"
                );
                ProviderError::Http(e)
            })?;

        let status = response.status();
        debug!(operation, status = %status, "Received HTTP response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string()
            });
            warn!(
                operation,
                status = %status,
                error = %message,
                latency_ms = start.elapsed().as_millis() as u64,
                "Provider returned an error status"
            );
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            warn!(operation, error = %e, "Failed to parse JSON response");
            ProviderError::Decode(format!("{operation}: {e}"))
        })?;

        debug!(
            operation,
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed successfully"
        );
        Ok(parsed)
    }
}

/// Pull a human-readable message out of a provider error body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["errorDescription", "message", "error"] {
            if let Some(Value::String(text)) = map.get(key) {
                return Some(text.clone());
            }
        }
    }

    Some(trimmed.to_string())
}

#[async_trait]
impl MfaProvider for AuthsignalClient {
    #[instrument(level = "debug", skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<UserRecord> {
        let url = self.endpoint(&["users", user_id])?;
        let mut user: UserRecord = self.send(self.client.get(url), "get_user").await?;
        if user.user_id.is_empty() {
            user.user_id = user_id.to_string();
        }
        Ok(user)
    }

    #[instrument(level = "debug", skip(self, attributes))]
    async fn track(
        &self,
        user_id: &str,
        action: &str,
        attributes: Option<&Attributes>,
    ) -> Result<TrackResult> {
        let url = self.endpoint(&["users", user_id, "actions", action])?;
        let empty = Attributes::new();
        let body = attributes.unwrap_or(&empty);
        self.send(self.client.post(url).json(body), "track").await
    }

    #[instrument(level = "debug", skip(self))]
    async fn create_challenge(
        &self,
        user_id: &str,
        authenticator_id: &str,
        action: &str,
    ) -> Result<DeviceChallengeResult> {
        let url = self.endpoint(&["challenge"])?;
        let body = CreateChallengeRequest {
            user_id,
            user_authenticator_id: authenticator_id,
            action,
        };
        self.send(self.client.post(url).json(&body), "create_challenge")
            .await
    }

    #[instrument(level = "debug", skip_all)]
    async fn validate_challenge(&self, token: &str) -> Result<ValidationResult> {
        let url = self.endpoint(&["validate"])?;
        self.send(
            self.client.post(url).json(&ValidateRequest { token }),
            "validate_challenge",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> AuthsignalClient {
        AuthsignalClient::new(AuthsignalConfig::new("secret").with_base_url(base_url)).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = AuthsignalConfig::new("secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.tenant_id.is_none());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AuthsignalConfig::new("super-secret-value");
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret-value"));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn test_endpoint_keeps_version_segment() {
        let c = client("https://api.authsignal.com/v1");
        let url = c.endpoint(&["users", "u1", "actions", "signIn"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.authsignal.com/v1/users/u1/actions/signIn"
        );
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash_and_encodes_segments() {
        let c = client("https://api.authsignal.com/v1/");
        let url = c.endpoint(&["users", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "https://api.authsignal.com/v1/users/a%20b%2Fc");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = AuthsignalClient::new(AuthsignalConfig::new("s").with_base_url("not a url"));
        assert!(matches!(result, Err(ProviderError::InvalidUrl(_))));
    }

    #[test]
    fn test_error_message_prefers_description() {
        let body = r#"{"error":"invalid_request","errorDescription":"User not found"}"#;
        assert_eq!(error_message(body).as_deref(), Some("User not found"));
        assert_eq!(
            error_message(r#"{"error":"unauthorized"}"#).as_deref(),
            Some("unauthorized")
        );
        assert_eq!(error_message("plain text").as_deref(), Some("plain text"));
        assert_eq!(error_message("   "), None);
    }
}
