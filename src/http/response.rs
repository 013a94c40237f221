//! HTTP response wrapper with parse helpers and call metadata

use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Result;

/// An HTTP response, plus metadata about the call that produced it.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: Bytes,
    retries_taken: u32,
    elapsed: Duration,
}

impl Response {
    /// Create a new response.
    pub fn new(status: StatusCode, headers: HeaderMap, url: Url, body: Bytes) -> Self {
        Self {
            status,
            headers,
            url,
            body,
            retries_taken: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The URL this response was received from (after any redirects).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the body as a lossily-decoded UTF-8 string.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Check if the response is successful (2xx status).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the response is a redirect (3xx status).
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    /// The `Location` header, when present and valid UTF-8.
    pub fn location(&self) -> Option<String> {
        self.headers
            .get(http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    /// Number of retries taken for this call (0 if the first attempt won).
    ///
    /// Redirect follows count as retries here since they consume an
    /// attempt-budget slot.
    pub fn retries_taken(&self) -> u32 {
        self.retries_taken
    }

    /// Wall-clock time for the whole call, waits included.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub(crate) fn stamp(&mut self, retries_taken: u32, elapsed: Duration) {
        self.retries_taken = retries_taken;
        self.elapsed = elapsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(status: u16, body: &'static [u8]) -> Response {
        Response::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            Url::parse("https://example.com/r").unwrap(),
            Bytes::from_static(body),
        )
    }

    #[test]
    fn test_classification() {
        assert!(response(200, b"").is_success());
        assert!(!response(200, b"").is_redirect());
        assert!(response(301, b"").is_redirect());
        assert!(!response(500, b"").is_success());
    }

    #[test]
    fn test_text_and_json() {
        let resp = response(200, br#"{"answer": 42}"#);
        assert_eq!(resp.text(), r#"{"answer": 42}"#);

        let parsed: serde_json::Value = resp.json().unwrap();
        assert_eq!(parsed["answer"], 42);
    }

    #[test]
    fn test_json_parse_failure() {
        let resp = response(200, b"not json");
        let result: Result<serde_json::Value> = resp.json();
        assert!(result.is_err());
    }

    #[test]
    fn test_location() {
        let mut headers = HeaderMap::new();
        headers.insert("location", "/next".parse().unwrap());
        let resp = Response::new(
            StatusCode::FOUND,
            headers,
            Url::parse("https://example.com/r").unwrap(),
            Bytes::new(),
        );
        assert_eq!(resp.location(), Some("/next".to_string()));
        assert_eq!(response(302, b"").location(), None);
    }

    #[test]
    fn test_metadata_stamp() {
        let mut resp = response(200, b"");
        assert_eq!(resp.retries_taken(), 0);
        resp.stamp(2, Duration::from_millis(1234));
        assert_eq!(resp.retries_taken(), 2);
        assert_eq!(resp.elapsed(), Duration::from_millis(1234));
    }
}
