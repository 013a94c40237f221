//! # surefetch
//!
//! Resilient outbound HTTP calls without hand-rolled retry loops:
//! - Automatic retries with exponential backoff and a configurable status set
//! - `Retry-After` / rate-limit header hints honored over computed backoff
//! - Per-attempt timeouts, optional whole-call deadlines, pre-attempt jitter
//! - Redirect policy control (follow, error, manual) with 303 method downgrade
//! - Typed request bodies and convenience response parsing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use surefetch::Client;
//!
//! #[tokio::main]
//! async fn main() -> surefetch::Result<()> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com/")
//!         .build()?;
//!
//!     let status: serde_json::Value = client
//!         .get("v1/status")
//!         .send()
//!         .await?
//!         .json()?;
//!
//!     println!("{status}");
//!     Ok(())
//! }
//! ```
//!
//! Retry behavior is governed by a [`RetryPolicy`] snapshot taken per call;
//! there is no global mutable default state. Non-success final responses
//! become [`Error::Status`] unless passthrough mode is enabled on the call.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub use body::Body;
pub use client::{CallBuilder, Client, ClientBuilder};
pub use config::{CallOptions, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use crate::http::{ReqwestTransport, Request, Response, Transport};
pub use redirect::RedirectPolicy;
pub use retry::{RetryPolicy, is_idempotent, next_interval, retry_hint, wait};

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod redirect;
pub mod retry;

/// Prelude module for common imports
///
/// # Examples
///
/// ```rust
/// use surefetch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Body, CallOptions, Client, Error, RedirectPolicy, Response, Result, RetryPolicy,
    };
}

/// Crate version, from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
