//! Request body as a tagged union, resolved once at construction
//!
//! Callers pick the body kind explicitly; nothing downstream re-inspects the
//! payload to guess how to encode it.

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

/// A request body and its wire encoding.
#[derive(Debug, Clone)]
pub enum Body {
    /// JSON document, serialized with `serde_json`.
    Json(serde_json::Value),
    /// Raw bytes, sent as-is with no content type.
    Raw(Bytes),
    /// Plain UTF-8 text.
    Text(String),
    /// URL-encoded form fields.
    Form(Vec<(String, String)>),
}

impl Body {
    /// Build a JSON body from any serializable value.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }

    /// Build a plain-text body.
    pub fn text(value: impl Into<String>) -> Self {
        Body::Text(value.into())
    }

    /// Build a raw-bytes body.
    pub fn raw(value: impl Into<Bytes>) -> Self {
        Body::Raw(value.into())
    }

    /// Build a URL-encoded form body from key/value pairs.
    pub fn form<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Body::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// The `Content-Type` this body implies, if any.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Body::Json(_) => Some("application/json"),
            Body::Raw(_) => None,
            Body::Text(_) => Some("text/plain; charset=utf-8"),
            Body::Form(_) => Some("application/x-www-form-urlencoded"),
        }
    }

    /// Encode the body into wire bytes.
    pub fn to_bytes(&self) -> Result<Bytes> {
        match self {
            Body::Json(value) => Ok(Bytes::from(serde_json::to_vec(value)?)),
            Body::Raw(bytes) => Ok(bytes.clone()),
            Body::Text(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Body::Form(fields) => {
                let mut serializer = url::form_urlencoded::Serializer::new(String::new());
                for (key, value) in fields {
                    serializer.append_pair(key, value);
                }
                Ok(Bytes::from(serializer.finish()))
            }
        }
    }
}
