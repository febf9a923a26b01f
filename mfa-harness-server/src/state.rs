//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use mfa_harness_core::{ChallengeOrchestrator, MfaProvider};

/// Application state containing shared resources.
///
/// Nothing here is mutable; each request works only with its own provider
/// responses.
#[derive(Clone)]
pub struct AppState {
    /// MFA provider used by the pass-through endpoints
    pub provider: Arc<dyn MfaProvider>,
    /// Token issuance over the same provider
    pub orchestrator: ChallengeOrchestrator<dyn MfaProvider>,
    /// Provider tenant, reported by /health
    pub tenant_id: Option<String>,
}

impl AppState {
    pub fn new(provider: Arc<dyn MfaProvider>, tenant_id: Option<String>) -> Self {
        Self {
            orchestrator: ChallengeOrchestrator::new(Arc::clone(&provider)),
            provider,
            tenant_id,
        }
    }
}
