//! Request target identity
//!
//! A [`Request`] is the mutable "current target" of one logical call: method,
//! URL, headers, and body. The redirect handler rewrites it between attempts;
//! the transport rebuilds the wire request from it on every attempt, so the
//! body stays replayable across retries.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::body::Body;
use crate::error::{Error, Result};

/// The request identity for one logical call.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Body>,
}

impl Request {
    /// Create a new request target.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Set a header, replacing any previous value for the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid per HTTP.
    pub fn header(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        let key = key
            .as_ref()
            .parse::<HeaderName>()
            .map_err(|_| Error::InvalidHeaderName(key.as_ref().to_string()))?;
        let value = value
            .as_ref()
            .parse::<HeaderValue>()
            .map_err(|_| Error::InvalidHeaderValue(value.as_ref().to_string()))?;
        self.headers.insert(key, value);
        Ok(())
    }

    /// Get the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the body, if any.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Set the body.
    pub fn set_body(&mut self, body: Body) {
        self.body = Some(body);
    }

    pub(crate) fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub(crate) fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    pub(crate) fn clear_body(&mut self) {
        self.body = None;
    }

    pub(crate) fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}
