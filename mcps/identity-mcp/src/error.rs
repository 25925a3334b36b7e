//! Error types for the identity lookup pipeline
//!
//! Every failure a tool can hit maps onto one of these variants. The server
//! boundary renders them as a single `Error: <message>` line.

use thiserror::Error;

/// Errors raised by the authenticated request pipeline
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Missing credentials, or an operation invoked in the wrong auth mode
    #[error("{0}")]
    Configuration(String),

    /// The upstream API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Server-provided error text, or the status text
        message: String,
    },

    /// Building or signing a payment authorization failed
    #[error("payment failed: {0}")]
    Payment(String),

    /// Caller input rejected before any network call
    #[error("invalid input: {0}")]
    Validation(String),

    /// The request could not be sent or its body could not be read
    #[error("request failed: {0}")]
    Transport(String),

    /// A success response did not have the expected shape
    #[error("unexpected response from API: {0}")]
    Decode(#[from] serde_json::Error),
}

impl IdentityError {
    /// The error reported when no credential is configured at all
    pub fn no_credentials() -> Self {
        IdentityError::Configuration(
            "no credentials configured: set IDENTITY_API_KEY for API-key access \
             or IDENTITY_PRIVATE_KEY for x402 pay-per-call access"
                .to_string(),
        )
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        IdentityError::Transport(e.to_string())
    }
}

/// Result type alias for identity operations
pub type IdentityResult<T> = Result<T, IdentityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_includes_status() {
        let err = IdentityError::Upstream {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "API error (429): rate limited");
    }

    #[test]
    fn test_no_credentials_mentions_both_variables() {
        let msg = IdentityError::no_credentials().to_string();
        assert!(msg.contains("IDENTITY_API_KEY"));
        assert!(msg.contains("IDENTITY_PRIVATE_KEY"));
    }
}
