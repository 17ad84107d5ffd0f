//! Errors returned by the DocuSign OAuth and REST clients.

use thiserror::Error;

/// Failure talking to DocuSign.
///
/// Handlers do not distinguish transient from permanent failures; every
/// variant is reported to the caller as an upstream error with its message.
#[derive(Debug, Error)]
pub enum DocuSignError {
    #[error("HTTP request to DocuSign failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to sign JWT assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The impersonated user has not granted consent to the integration key.
    /// Consent must be granted by an operator; the gateway never retries.
    #[error(
        "consent_required: the user has not granted consent to integration key {integration_key}. \
         Grant consent (admin consent or the individual consent URL) and retry"
    )]
    ConsentRequired { integration_key: String },

    #[error("OAuth token request failed with status {status}: {error}{}", parenthesized(.description))]
    OAuth {
        status: u16,
        error: String,
        description: Option<String>,
    },

    #[error("DocuSign API error (status {status}{}): {message}", comma_prefixed(.error_code))]
    Api {
        status: u16,
        error_code: Option<String>,
        message: String,
    },

    #[error("Unexpected DocuSign response: {0}")]
    UnexpectedResponse(String),
}

impl DocuSignError {
    /// Whether this error is the consent-not-granted condition.
    pub fn is_consent_required(&self) -> bool {
        matches!(self, DocuSignError::ConsentRequired { .. })
    }
}

fn parenthesized(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default()
}

fn comma_prefixed(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(", {}", d)).unwrap_or_default()
}
