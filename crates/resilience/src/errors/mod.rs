//! Error types and retry classification for upstream sources.
//!
//! This module provides:
//! - [`SourceError`]: The error enum returned by every upstream request
//! - [`RetryClass`]: Classification that tells the orchestrator how to react

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors returned by a single attempt against an upstream source.
///
/// None of these ever reach the callers of the public query operations: the
/// orchestrator records them, rotates, falls back, and finally substitutes a
/// last-resort value. They surface only through diagnostics and `last_error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The request did not complete within the attempt timeout.
    #[error("Timeout: {provider}")]
    Timeout {
        /// Provider name or candidate label
        provider: String,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// Provider name or candidate label
        provider: String,
    },

    /// The credential was rejected (HTTP 401/403).
    #[error("Unauthorized: {provider}")]
    Unauthorized {
        /// Provider name or candidate label
        provider: String,
    },

    /// Any other non-success HTTP status.
    #[error("HTTP {status} from {provider}")]
    Http {
        /// Provider name or candidate label
        provider: String,
        /// HTTP status code
        status: u16,
    },

    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("Network error: {provider} - {message}")]
    Network {
        /// Provider name or candidate label
        provider: String,
        /// Transport error description
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Malformed response from {provider}: {message}")]
    Malformed {
        /// Provider name or candidate label
        provider: String,
        /// Decoder error description
        message: String,
    },

    /// The provider answered with an application-level error.
    #[error("Rejected by {provider}: {message}")]
    Rejected {
        /// Provider name or candidate label
        provider: String,
        /// Error reported by the provider
        message: String,
    },

    /// The response decoded but carried unusable values.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// The provider does not know the requested asset or account.
    #[error("Not found: {provider} - {what}")]
    NotFound {
        /// Provider name or candidate label
        provider: String,
        /// What was looked up
        what: String,
    },

    /// The provider cannot serve this kind of request.
    #[error("Unsupported by {provider}: {what}")]
    Unsupported {
        /// Provider name or candidate label
        provider: String,
        /// Description of the unsupported request
        what: String,
    },
}

impl SourceError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::FailoverWithPenalty`]: the candidate is at fault; record
    ///   a failure against it and rotate to another one.
    /// - [`RetryClass::NextProvider`]: the request itself cannot be served by
    ///   this provider; leave the family without penalising the candidate.
    ///
    /// # Examples
    ///
    /// ```
    /// use solbot_resilience::errors::{RetryClass, SourceError};
    ///
    /// let error = SourceError::RateLimited { provider: "COINGECKO".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    ///
    /// let error = SourceError::NotFound {
    ///     provider: "BINANCE".to_string(),
    ///     what: "FOOUSDT".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Timeout { .. }
            | Self::RateLimited { .. }
            | Self::Unauthorized { .. }
            | Self::Http { .. }
            | Self::Network { .. }
            | Self::Malformed { .. }
            | Self::Rejected { .. }
            | Self::ValidationFailed { .. } => RetryClass::FailoverWithPenalty,

            Self::NotFound { .. } | Self::Unsupported { .. } => RetryClass::NextProvider,
        }
    }

    /// Build the error for a non-success HTTP status.
    pub fn from_status(provider: impl Into<String>, status: u16) -> Self {
        let provider = provider.into();
        match status {
            429 => Self::RateLimited { provider },
            401 | 403 => Self::Unauthorized { provider },
            _ => Self::Http { provider, status },
        }
    }
}
