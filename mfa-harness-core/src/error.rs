use thiserror::Error;

/// Failure of a single call against the MFA provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),

    #[error("Provider configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Mock(String),
}

/// Fatal failures of challenge issuance.
///
/// Device-challenge creation failures never appear here; they are recovered
/// inside the orchestrator.
#[derive(Error, Debug)]
pub enum IssuanceError {
    #[error("{0}")]
    UserLookupFailed(#[source] ProviderError),

    #[error("{0}")]
    ActionTrackingFailed(#[source] ProviderError),
}

impl IssuanceError {
    /// The provider failure underneath this error.
    pub fn provider_error(&self) -> &ProviderError {
        match self {
            Self::UserLookupFailed(e) | Self::ActionTrackingFailed(e) => e,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
