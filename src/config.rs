//! Per-call options and their defaults
//!
//! A [`CallOptions`] snapshot is built once per logical call: the client's
//! configured defaults are cloned and the call builder's setters override
//! them. There is no global mutable default state.

use std::time::Duration;

use crate::redirect::RedirectPolicy;
use crate::retry::RetryPolicy;

/// Default per-attempt timeout (15 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Options governing one logical call.
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Per-attempt timeout. `Duration::ZERO` disables it.
    pub timeout: Duration,

    /// Upper bound of the randomized pre-attempt delay. Zero skips it.
    pub jitter: Duration,

    /// Whole-call time budget. Once exceeded, no further attempts are made
    /// and the call fails with a timeout error.
    pub deadline: Option<Duration>,

    /// Retry policy for this call.
    pub retry: RetryPolicy,

    /// How 3xx responses are handled.
    pub redirect: RedirectPolicy,

    /// When true, non-success final responses are returned as-is instead of
    /// converted into [`Error::Status`](crate::Error::Status).
    pub passthrough: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            jitter: Duration::ZERO,
            deadline: None,
            retry: RetryPolicy::default(),
            redirect: RedirectPolicy::default(),
            passthrough: false,
        }
    }
}

impl CallOptions {
    /// Options with retrying disabled (single attempt).
    pub fn no_retry() -> Self {
        Self {
            retry: RetryPolicy::disabled(),
            ..Self::default()
        }
    }
}
