//! MFA Harness Server - backend test harness for mobile MFA flows
//!
//! Exposes Authsignal-backed endpoints for a mobile client:
//! - POST /test/registration-token - Token for enrolling a device credential
//! - POST /test/challenge-token - Sign-in challenge token (device-bound when possible)
//! - POST /api/track, POST /api/validate, GET /api/user/{userId} - Provider pass-through

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use mfa_harness_core::{AuthsignalClient, AuthsignalConfig, MfaProvider, MockProvider};
use mfa_harness_server::{create_router_with_config, AppState, Config};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "mfa_harness_server=info,mfa_harness_core=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .init();

    let config = Config::from_env();

    let (provider, tenant_id): (Arc<dyn MfaProvider>, Option<String>) =
        if config.use_mock_provider {
            tracing::warn!("MOCK_PROVIDER=true: serving canned tokens, no provider calls are made");
            (Arc::new(MockProvider::new()), None)
        } else {
            let provider_config = AuthsignalConfig::from_env()
                .context("Failed to load Authsignal configuration")?;
            tracing::info!(
                base_url = %provider_config.base_url,
                tenant = provider_config.tenant_id.as_deref().unwrap_or("unset"),
                "Using Authsignal provider"
            );
            let tenant_id = provider_config.tenant_id.clone();
            let client =
                AuthsignalClient::new(provider_config).context("Failed to create Authsignal client")?;
            (Arc::new(client), tenant_id)
        };

    let app = create_router_with_config(AppState::new(provider, tenant_id), &config);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Listening on http://{}", addr);
    tracing::info!(
        "Registration token: curl -X POST http://{addr}/test/registration-token -H 'Content-Type: application/json' -d '{{\"userId\":\"test_user_123\"}}'"
    );
    tracing::info!(
        "Challenge token: curl -X POST http://{addr}/test/challenge-token -H 'Content-Type: application/json' -d '{{\"userId\":\"test_user_123\",\"phoneNumber\":\"+1234567890\"}}'"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Gracefully shutdown");
}
