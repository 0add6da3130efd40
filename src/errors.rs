use reqwest::StatusCode;
use thiserror::Error;

/// The detailed reason a provider call failed. Only ever logged; callers observe the
/// enclosing [`ResolutionError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("provider call failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("provider responded with status: {0}")]
    Status(StatusCode),

    #[error("failed to parse provider JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider reported no match")]
    NotFound,

    #[error("provider credential is not configured")]
    MissingCredential,

    #[error("supplied provider url is not a base url to query: {0}")]
    NotABaseUrl(url::Url),
}

/// A resolver could not produce its value. Every provider sub-cause collapses into this one
/// outcome at the resolver boundary.
#[derive(Debug, Error)]
#[error("could not resolve {subject}: {cause}")]
pub struct ResolutionError {
    subject: &'static str,
    #[source]
    cause: ProviderError,
}

impl ResolutionError {
    pub const fn new(subject: &'static str, cause: ProviderError) -> Self {
        Self { subject, cause }
    }

    pub const fn subject(&self) -> &'static str {
        self.subject
    }
}
