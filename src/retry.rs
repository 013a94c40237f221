//! Retry policy, backoff calculation, and the per-attempt retry decision
//!
//! This is the decision core of the crate: given one attempt's outcome, decide
//! whether the call loop should stop, wait-and-retry, or follow a redirect.
//! The loop in [`crate::client`] performs the actual waiting and dispatching.

use std::collections::HashSet;
use std::time::Duration;

use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::http::Response;
use crate::redirect::RedirectPolicy;

/// Response headers recognized as server-supplied retry hints, in priority
/// order. The first header that is present and parses wins.
pub const RETRY_HINT_HEADERS: [&str; 2] = ["retry-after", "x-ratelimit-reset-after"];

/// Configuration for retry behavior.
///
/// Immutable for the duration of one logical call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempt budget, including the first try. Always at least 1.
    pub max_attempts: u32,

    /// Base interval for exponential backoff.
    pub base_interval: Duration,

    /// Ceiling for backoff and for server retry hints. A computed wait above
    /// this value terminates retrying instead.
    pub max_interval: Duration,

    /// Honor `Retry-After`-style response headers over computed backoff.
    pub respect_retry_after: bool,

    /// Response statuses eligible for retry.
    pub retryable_statuses: HashSet<u16>,

    /// Whether a timed-out attempt is retryable.
    pub retry_on_timeout: bool,

    /// If true, non-idempotent methods (POST, PATCH, CONNECT) are never
    /// retried.
    pub idempotent_only: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_interval: Duration::from_secs(3),
            max_interval: Duration::from_secs(30),
            respect_retry_after: true,
            retryable_statuses: [500, 502, 503, 504, 408, 429].into_iter().collect(),
            retry_on_timeout: false,
            idempotent_only: false,
        }
    }
}

impl RetryPolicy {
    /// Policy that disables retrying entirely (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Clamp fields to their documented minimums.
    ///
    /// `max_attempts` is at least 1, `base_interval` at least 10ms,
    /// `max_interval` at least 1s.
    pub fn normalized(mut self) -> Self {
        self.max_attempts = self.max_attempts.max(1);
        self.base_interval = self.base_interval.max(Duration::from_millis(10));
        self.max_interval = self.max_interval.max(Duration::from_secs(1));
        self
    }
}

/// Whether an HTTP method is safe to repeat without duplicating side effects.
pub fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET
            | Method::HEAD
            | Method::PUT
            | Method::DELETE
            | Method::OPTIONS
            | Method::TRACE
    )
}

/// Suspend the caller for `duration`, optionally randomized.
///
/// A zero duration returns immediately without touching the timer. With
/// `jitter`, the actual sleep is uniform in `[0, duration)`, truncated to
/// whole milliseconds, which desynchronizes herds of retrying clients.
pub async fn wait(duration: Duration, jitter: bool) {
    if duration.is_zero() {
        return;
    }
    let duration = if jitter {
        Duration::from_millis((duration.as_secs_f64() * fastrand::f64() * 1000.0) as u64)
    } else {
        duration
    };
    if duration.is_zero() {
        return;
    }
    tokio::time::sleep(duration).await;
}

/// Compute the wait before the next attempt.
///
/// When the policy honors retry hints and the response carries one that
/// parses, the hint wins (floored at `base_interval`, deliberately uncapped —
/// the ceiling comparison is the decision function's job). Otherwise the
/// backoff law is `base_interval * 2^attempt`, capped at `max_interval`.
pub fn next_interval(attempt: u32, policy: &RetryPolicy, headers: Option<&HeaderMap>) -> Duration {
    if policy.respect_retry_after {
        if let Some(hint) = headers.and_then(retry_hint) {
            return hint.max(policy.base_interval);
        }
    }
    let backoff = policy.base_interval.as_secs_f64() * 2f64.powi(attempt.min(63) as i32);
    Duration::from_secs_f64(backoff.min(policy.max_interval.as_secs_f64()))
}

/// Extract a server retry hint from response headers.
///
/// Headers are consulted in [`RETRY_HINT_HEADERS`] order; a present but
/// unparseable value is skipped, never an error.
pub fn retry_hint(headers: &HeaderMap) -> Option<Duration> {
    RETRY_HINT_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_hint)
    })
}

/// Parse a retry hint value: integer seconds, or an HTTP date converted to
/// seconds from now (ceiling-rounded, floored at zero).
fn parse_hint(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let date = chrono::DateTime::parse_from_rfc2822(raw).ok()?;
    let millis = (date.with_timezone(&chrono::Utc) - chrono::Utc::now()).num_milliseconds();
    if millis <= 0 {
        return Some(Duration::ZERO);
    }
    Some(Duration::from_secs((millis as u64).div_ceil(1000)))
}

/// What the call loop should do after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Terminate the loop with the current outcome.
    Stop,
    /// Wait the given interval (non-jittered), then retry.
    RetryAfter(Duration),
    /// Rewrite the target from the redirect response and continue without a
    /// backoff wait.
    FollowRedirect,
}

/// Decide how the loop proceeds after attempt `attempt` produced `outcome`.
///
/// `expired` reports whether the whole-call deadline has already passed;
/// an expired call never continues. Returns `Err` only for the fatal
/// redirect-refused path.
pub(crate) fn evaluate(
    attempt: u32,
    policy: &RetryPolicy,
    method: &Method,
    redirect: RedirectPolicy,
    passthrough: bool,
    expired: bool,
    outcome: &std::result::Result<Response, Error>,
) -> Result<Verdict> {
    // Continuation is impossible once the budget is spent or the call's
    // deadline has fired; fatal classifications below still take precedence.
    let spent = attempt + 1 >= policy.max_attempts || expired;

    match outcome {
        Ok(response) => {
            if response.is_success() {
                return Ok(Verdict::Stop);
            }

            if response.is_redirect() {
                return match redirect {
                    RedirectPolicy::Manual => Ok(Verdict::Stop),
                    RedirectPolicy::Error => Err(Error::Redirect {
                        status: response.status().as_u16(),
                        location: response.location(),
                    }),
                    RedirectPolicy::Follow if spent => Ok(Verdict::Stop),
                    RedirectPolicy::Follow => Ok(Verdict::FollowRedirect),
                };
            }

            // Failure status. Gates are checked in fixed order: budget,
            // idempotency, passthrough, status set, interval ceiling.
            if spent {
                return Ok(Verdict::Stop);
            }
            if policy.idempotent_only && !is_idempotent(method) {
                return Ok(Verdict::Stop);
            }
            if passthrough {
                return Ok(Verdict::Stop);
            }
            if !policy.retryable_statuses.contains(&response.status().as_u16()) {
                return Ok(Verdict::Stop);
            }
            let interval = next_interval(attempt, policy, Some(response.headers()));
            if interval > policy.max_interval {
                tracing::debug!(
                    wait_secs = interval.as_secs_f64(),
                    "server retry hint exceeds max_interval, giving up"
                );
                return Ok(Verdict::Stop);
            }
            Ok(Verdict::RetryAfter(interval))
        }
        Err(error) => {
            if error.is_timeout() && policy.retry_on_timeout && !spent {
                return Ok(Verdict::RetryAfter(next_interval(attempt, policy, None)));
            }
            // Everything else, including Error::Fatal and plain connection
            // failures, propagates immediately.
            Ok(Verdict::Stop)
        }
    }
}
