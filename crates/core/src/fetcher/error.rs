//! Error types for the fetcher module.

use std::time::Duration;
use thiserror::Error;

use crate::error_chain;
use crate::store::StoreError;

/// Errors that can occur while fetching one asset.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the timeout.
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// Could not connect to the remote host.
    #[error("Connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("Failed to read body from {url}: {reason}")]
    Body { url: String, reason: String },

    /// Any other request failure.
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// Persisting the payload failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl FetchError {
    /// Classifies a reqwest error for `url`.
    pub fn from_reqwest(url: &str, timeout: Duration, error: reqwest::Error) -> Self {
        let url = url.to_string();
        let reason = error_chain(&error);
        if error.is_timeout() {
            Self::Timeout { url, timeout }
        } else if error.is_connect() {
            Self::Connect { url, reason }
        } else if error.is_body() || error.is_decode() {
            Self::Body { url, reason }
        } else {
            Self::Request { url, reason }
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } | Self::Body { .. } | Self::Request { .. } => {
                true
            }
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Store(_) | Self::ClientBuild(_) => false,
        }
    }

    /// One-line cause including the underlying error chain.
    pub fn cause(&self) -> String {
        error_chain(self)
    }
}
