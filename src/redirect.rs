//! Redirect policy and target rewriting between attempts

use http::Method;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::http::{Request, Response};

/// How 3xx responses are handled by the call loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectPolicy {
    /// Follow the redirect, rewriting the request target for the next
    /// attempt.
    #[default]
    Follow,
    /// Treat any redirect as a fatal [`Error::Redirect`].
    Error,
    /// Return the redirect response to the caller as-is.
    Manual,
}

/// Rewrite `request` in place so the next attempt targets the redirect
/// destination.
///
/// Resolves the `Location` header against the response URL. A 303 (See
/// Other) downgrades the method to GET and drops the body, per HTTP
/// semantics; every other 3xx preserves method, headers, and body. A
/// missing or unresolvable `Location` is a fatal [`Error::Redirect`].
pub(crate) fn rewrite(request: &mut Request, response: &Response) -> Result<()> {
    let status = response.status();
    let location = response.location().ok_or_else(|| Error::Redirect {
        status: status.as_u16(),
        location: None,
    })?;

    let next_url = response
        .url()
        .join(&location)
        .map_err(|e| Error::InvalidUrl(format!("redirect target '{location}': {e}")))?;

    tracing::debug!(status = status.as_u16(), target = %next_url, "following redirect");

    if status == http::StatusCode::SEE_OTHER {
        request.set_method(Method::GET);
        request.clear_body();
    }
    request.set_url(next_url);
    Ok(())
}
