use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the quotewatch workspace.
///
/// The first four variants form the per-attempt taxonomy of a single quote
/// request and, with `NotFound` for answers without quote data, are absorbed
/// by the retrying fetcher and never escape a batch run. The remaining
/// variants cover argument validation and local storage.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuoteError {
    /// No response arrived within the per-attempt deadline.
    #[error("request timed out for {code}")]
    Timeout {
        /// Instrument code whose request was cancelled.
        code: String,
    },

    /// The quote service answered with a non-success status.
    #[error("server returned {status}")]
    ServerError {
        /// HTTP status code.
        status: u16,
    },

    /// The body could not be decoded as quote data.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The service answered but carried no quote data for the code.
    #[error("no quote data for {code}: {reason}")]
    NotFound {
        /// Requested instrument code.
        code: String,
        /// Service-provided reason, or a generic description.
        reason: String,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Reading or writing the local key-value store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl QuoteError {
    /// Helper: build a `Timeout` error for a code.
    pub fn timeout(code: impl Into<String>) -> Self {
        Self::Timeout { code: code.into() }
    }

    /// Helper: build a `ServerError` for an HTTP status.
    #[must_use]
    pub const fn server(status: u16) -> Self {
        Self::ServerError { status }
    }

    /// Helper: build a `MalformedResponse` error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Helper: build a `NetworkUnavailable` error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkUnavailable(msg.into())
    }

    /// Helper: build a `NotFound` error for a code and reason.
    pub fn not_found(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Helper: build a `Storage` error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Returns true if another attempt for the same code may succeed.
    ///
    /// Every failure of a quote request is retryable, including a response
    /// without quote data. Only local errors are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ServerError { .. }
                | Self::MalformedResponse(_)
                | Self::NetworkUnavailable(_)
                | Self::NotFound { .. }
        )
    }
}
