//! Client surface and the call loop
//!
//! The client owns the transport and the configured defaults; the loop in
//! [`Client::execute`] is the composition root that drives attempts,
//! consults the retry decision between them, and rewrites the target on
//! followed redirects.

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use url::Url;

use crate::body::Body;
use crate::config::CallOptions;
use crate::error::{Error, Result};
use crate::http::{ReqwestTransport, Request, Response, Transport};
use crate::redirect::{self, RedirectPolicy};
use crate::retry::{self, RetryPolicy, Verdict};

/// HTTP client with automatic retries, timeouts, and redirect control.
///
/// Cheap to clone; clones share the underlying transport and defaults.
///
/// # Example
///
/// ```rust,no_run
/// use surefetch::Client;
///
/// # async fn example() -> surefetch::Result<()> {
/// let client = Client::new();
/// let response = client.get("https://example.com/health").send().await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

struct ClientInner {
    /// Transport used for each attempt.
    transport: Arc<dyn Transport>,
    /// Base URL relative request paths are joined against.
    base_url: Option<Url>,
    /// Headers applied to every request unless the call sets the same name.
    default_headers: HeaderMap,
    /// Per-call option defaults.
    defaults: CallOptions,
}

impl Client {
    /// Create a client with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed. Use
    /// [`Client::try_new()`] for fallible construction.
    pub fn new() -> Self {
        Self::builder()
            .build()
            .expect("failed to build client with default configuration")
    }

    /// Create a client with default configuration (fallible version).
    pub fn try_new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a client builder for advanced configuration.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client over a custom transport.
    ///
    /// This is the seam for alternative transports and for tests.
    pub fn from_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                base_url: None,
                default_headers: HeaderMap::new(),
                defaults: CallOptions::default(),
            }),
        }
    }

    /// Start a GET call.
    pub fn get(&self, url: impl AsRef<str>) -> CallBuilder {
        self.request(Method::GET, url)
    }

    /// Start a POST call.
    pub fn post(&self, url: impl AsRef<str>) -> CallBuilder {
        self.request(Method::POST, url)
    }

    /// Start a PUT call.
    pub fn put(&self, url: impl AsRef<str>) -> CallBuilder {
        self.request(Method::PUT, url)
    }

    /// Start a DELETE call.
    pub fn delete(&self, url: impl AsRef<str>) -> CallBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start a HEAD call.
    pub fn head(&self, url: impl AsRef<str>) -> CallBuilder {
        self.request(Method::HEAD, url)
    }

    /// Start a PATCH call.
    pub fn patch(&self, url: impl AsRef<str>) -> CallBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start a call with an explicit method.
    ///
    /// Relative URLs are joined against the configured base URL.
    pub fn request(&self, method: Method, url: impl AsRef<str>) -> CallBuilder {
        let url = url.as_ref();
        let resolved = match &self.inner.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        }
        .map_err(|e| Error::InvalidUrl(format!("'{url}': {e}")));

        CallBuilder {
            client: self.clone(),
            request: resolved.map(|url| Request::new(method, url)),
            opts: self.inner.defaults.clone(),
        }
    }

    /// Drive one logical call to completion.
    pub(crate) async fn execute(&self, mut request: Request, opts: &CallOptions) -> Result<Response> {
        let policy = opts.retry.clone().normalized();
        let started = Instant::now();
        let deadline = opts.deadline.map(|budget| started + budget);

        for (key, value) in &self.inner.default_headers {
            if !request.headers().contains_key(key) {
                request.headers_mut().insert(key.clone(), value.clone());
            }
        }

        let mut attempt: u32 = 0;
        loop {
            if let Some(at) = deadline {
                if Instant::now() >= at {
                    return Err(Error::Timeout(opts.deadline.unwrap_or_default()));
                }
            }

            retry::wait(opts.jitter, true).await;

            tracing::debug!(
                attempt,
                method = %request.method(),
                url = %request.url(),
                "dispatching attempt"
            );
            let timeout = effective_timeout(opts.timeout, deadline);
            let outcome = self.inner.transport.execute(&request, timeout).await;

            let expired = deadline.is_some_and(|at| Instant::now() >= at);
            let verdict = retry::evaluate(
                attempt,
                &policy,
                request.method(),
                opts.redirect,
                opts.passthrough,
                expired,
                &outcome,
            )?;

            match verdict {
                Verdict::Stop => return finish(outcome, opts, attempt, started.elapsed()),
                Verdict::RetryAfter(interval) => {
                    tracing::warn!(
                        attempt,
                        wait_secs = interval.as_secs_f64(),
                        url = %request.url(),
                        "attempt failed, retrying"
                    );
                    retry::wait(interval, false).await;
                }
                Verdict::FollowRedirect => {
                    if let Ok(response) = &outcome {
                        redirect::rewrite(&mut request, response)?;
                    }
                }
            }
            attempt += 1;
        }
    }
}

/// Per-attempt time bound: the smaller of the configured timeout and the
/// time remaining until the call deadline.
fn effective_timeout(timeout: Duration, deadline: Option<Instant>) -> Option<Duration> {
    let per_attempt = (!timeout.is_zero()).then_some(timeout);
    let remaining = deadline.map(|at| at.saturating_duration_since(Instant::now()));
    match (per_attempt, remaining) {
        (Some(t), Some(r)) => Some(t.min(r)),
        (Some(t), None) => Some(t),
        (None, r) => r,
    }
}

/// Terminal conversion: success and passthrough responses go back as-is, a
/// manual-policy redirect goes back as-is, anything else non-success becomes
/// [`Error::Status`]. Errors propagate untouched.
fn finish(
    outcome: std::result::Result<Response, Error>,
    opts: &CallOptions,
    attempt: u32,
    elapsed: Duration,
) -> Result<Response> {
    let mut response = outcome?;
    response.stamp(attempt, elapsed);

    let manual_redirect = response.is_redirect() && opts.redirect == RedirectPolicy::Manual;
    if response.is_success() || opts.passthrough || manual_redirect {
        Ok(response)
    } else {
        Err(Error::Status {
            status: response.status().as_u16(),
            url: response.url().to_string(),
            body: response.body().clone(),
        })
    }
}

/// Builder for a configured [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    default_headers: HeaderMap,
    defaults: CallOptions,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Set the base URL relative request paths are joined against.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a header sent with every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid per HTTP.
    pub fn default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self> {
        let key_str = key.into();
        let value_str = value.into();
        let key = key_str
            .parse::<HeaderName>()
            .map_err(|_| Error::InvalidHeaderName(key_str))?;
        let value = value_str
            .parse::<HeaderValue>()
            .map_err(|_| Error::InvalidHeaderValue(value_str))?;
        self.default_headers.insert(key, value);
        Ok(self)
    }

    /// Set the default per-attempt timeout. `Duration::ZERO` disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = timeout;
        self
    }

    /// Set the default pre-attempt jitter bound.
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.defaults.jitter = jitter;
        self
    }

    /// Set the default retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.defaults.retry = retry;
        self
    }

    /// Set the default redirect policy.
    pub fn redirect(mut self, redirect: RedirectPolicy) -> Self {
        self.defaults.redirect = redirect;
        self
    }

    /// Default to returning non-success responses as-is instead of
    /// converting them into status errors.
    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.defaults.passthrough = passthrough;
        self
    }

    /// Use a custom transport instead of the built-in reqwest one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty, unparseable, or not
    /// http/https, or if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<Client> {
        let base_url = match self.base_url {
            Some(raw) => {
                if raw.trim().is_empty() {
                    return Err(Error::InvalidUrl("base URL cannot be empty".to_string()));
                }
                let url: Url = raw
                    .parse()
                    .map_err(|e| Error::InvalidUrl(format!("'{raw}': {e}")))?;
                match url.scheme() {
                    "http" | "https" => {}
                    scheme => {
                        return Err(Error::InvalidUrl(format!(
                            "invalid scheme '{scheme}', only http and https are supported"
                        )));
                    }
                }
                Some(url)
            }
            None => None,
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base_url,
                default_headers: self.default_headers,
                defaults: CallOptions {
                    retry: self.defaults.retry.normalized(),
                    ..self.defaults
                },
            }),
        })
    }
}

/// Builder for one call: target, body, and per-call option overrides.
pub struct CallBuilder {
    client: Client,
    request: Result<Request>,
    opts: CallOptions,
}

impl CallBuilder {
    /// Set a request header.
    pub fn header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let result = match &mut self.request {
            Ok(request) => request.header(key, value),
            Err(_) => Ok(()),
        };
        if let Err(e) = result {
            self.request = Err(e);
        }
        self
    }

    /// Set a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        if self.request.is_ok() {
            match Body::json(value) {
                Ok(body) => {
                    if let Ok(request) = &mut self.request {
                        request.set_body(body);
                    }
                }
                Err(e) => self.request = Err(e),
            }
        }
        self
    }

    /// Set a URL-encoded form body.
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        if let Ok(request) = &mut self.request {
            request.set_body(Body::form(fields));
        }
        self
    }

    /// Set an explicit body.
    pub fn body(mut self, body: Body) -> Self {
        if let Ok(request) = &mut self.request {
            request.set_body(body);
        }
        self
    }

    /// Override the per-attempt timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Override the pre-attempt jitter bound for this call.
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.opts.jitter = jitter;
        self
    }

    /// Bound the whole call, waits included.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.opts.deadline = Some(deadline);
        self
    }

    /// Override the retry policy for this call.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.opts.retry = retry;
        self
    }

    /// Disable retrying for this call (single attempt).
    pub fn no_retry(mut self) -> Self {
        self.opts.retry = RetryPolicy::disabled();
        self
    }

    /// Override the redirect policy for this call.
    pub fn redirect(mut self, redirect: RedirectPolicy) -> Self {
        self.opts.redirect = redirect;
        self
    }

    /// Return non-success responses as-is instead of status errors.
    pub fn passthrough(mut self) -> Self {
        self.opts.passthrough = true;
        self
    }

    /// Perform the call.
    pub async fn send(self) -> Result<Response> {
        let request = self.request?;
        self.client.execute(request, &self.opts).await
    }

    /// Perform the call, discarding the failure cause.
    ///
    /// Returns `None` on any error; the cause is logged at warn level. Use
    /// [`send`](Self::send) when the caller needs to branch on the error.
    pub async fn send_opt(self) -> Option<Response> {
        match self.send().await {
            Ok(response) => Some(response),
            Err(error) => {
                tracing::warn!(%error, "request failed");
                None
            }
        }
    }

    /// Perform the call and parse the response body as JSON.
    pub async fn fetch_json<T: DeserializeOwned>(self) -> Result<T> {
        self.send().await?.json()
    }
}
