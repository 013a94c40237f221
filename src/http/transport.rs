//! Transport seam: the fetch-style primitive the retry engine drives
//!
//! The engine only ever talks to a [`Transport`]; the reqwest-backed
//! implementation is the production one, and tests inject scripted
//! transports through the same trait.

use std::time::Duration;

use async_trait::async_trait;

use super::{Request, Response};
use crate::error::{Error, Result};

/// One transport call: dispatch the request, return the response or a
/// classified error.
///
/// Implementations return redirects and error statuses as ordinary
/// responses; outcome classification is the retry engine's job. Thrown
/// errors are either [`Error::Timeout`] (the attempt exceeded `timeout`)
/// or [`Error::Connection`] (DNS, TLS, reset, and friends).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one attempt, bounded by `timeout` when given.
    async fn execute(&self, request: &Request, timeout: Option<Duration>) -> Result<Response>;
}

/// Production transport backed by a shared `reqwest::Client`.
///
/// Automatic redirect following is disabled on the client: the retry loop
/// owns 3xx handling so the redirect policy can be enforced.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the default client configuration.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("surefetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing `reqwest::Client`.
    ///
    /// The client should have automatic redirects disabled, otherwise the
    /// redirect policy never sees a 3xx.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &Request, timeout: Option<Duration>) -> Result<Response> {
        let mut req = self
            .client
            .request(request.method().clone(), request.url().clone());

        for (key, value) in request.headers() {
            req = req.header(key, value);
        }

        if let Some(body) = request.body() {
            if let Some(content_type) = body.content_type() {
                if !request.headers().contains_key(http::header::CONTENT_TYPE) {
                    req = req.header(http::header::CONTENT_TYPE, content_type);
                }
            }
            req = req.body(body.to_bytes()?);
        }

        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(timeout.unwrap_or(Duration::ZERO))
            } else {
                Error::Connection(e.to_string())
            }
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let url = resp.url().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(Response::new(status, headers, url, body))
    }
}
