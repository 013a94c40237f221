//! Error types for surefetch
//!
//! This module provides the error taxonomy for the retry engine and its
//! boundary layer, following Rust idioms with the `thiserror` crate.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

/// Result type alias for operations that can fail with a surefetch error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for surefetch.
#[derive(Debug, Error)]
pub enum Error {
    /// Final response had a non-success status and passthrough mode was off.
    ///
    /// Carries the status code, the final URL, and the response body so the
    /// caller can still inspect what the server said.
    #[error("HTTP status {status} from {url}")]
    Status {
        /// HTTP status code of the final response
        status: u16,
        /// URL the final attempt was sent to
        url: String,
        /// Raw response body
        body: Bytes,
    },

    /// A redirect response was encountered while the redirect policy is
    /// [`RedirectPolicy::Error`](crate::redirect::RedirectPolicy::Error),
    /// or a redirect could not be followed (missing/invalid `Location`).
    ///
    /// Always fatal; never retried.
    #[error("redirect (status {status}) refused by policy")]
    Redirect {
        /// HTTP status code of the redirect response
        status: u16,
        /// `Location` header value, when present
        location: Option<String>,
    },

    /// An attempt exceeded its timeout and was aborted.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Network or connection error from the transport (DNS, TLS, reset).
    ///
    /// Propagated immediately; never retried.
    #[error("connection error: {0}")]
    Connection(String),

    /// Unconditionally fatal error that bypasses all retry handling.
    ///
    /// Exists for test harnesses that need to force an immediate,
    /// non-retried failure out of a transport.
    #[error("fatal: {0}")]
    Fatal(String),

    /// Invalid URL provided or produced by redirect resolution.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid HTTP header name.
    #[error("invalid HTTP header name: {0}")]
    InvalidHeaderName(String),

    /// Invalid HTTP header value.
    #[error("invalid HTTP header value: {0}")]
    InvalidHeaderValue(String),

    /// HTTP client configuration or initialization error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Check if this error is a timeout/cancellation classification.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } | Error::Redirect { status, .. } => Some(*status),
            _ => None,
        }
    }
}
