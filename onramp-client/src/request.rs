//! Request descriptions.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{OnrampError, Result};
use crate::resolve::EndpointCategory;

/// HTTP method of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Request body: a serializable structure or an ordered key-value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<B> {
    Typed(B),
    Untyped(Map<String, Value>),
}

impl Payload<()> {
    /// Build an untyped payload, keeping insertion order.
    pub fn untyped<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Untyped(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<B: Serialize> Payload<B> {
    /// Serialize to the JSON bytes sent on the wire.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let encoded = match self {
            Self::Typed(body) => serde_json::to_vec(body),
            Self::Untyped(map) => serde_json::to_vec(map),
        };
        encoded.map_err(|e| OnrampError::Unknown(format!("Failed to encode request: {}", e)))
    }
}

/// Immutable description of one call.
///
/// The authentication strategy is not part of the description: it follows
/// from [`EndpointCategory`].
#[derive(Debug, Clone)]
pub struct RequestSpec<B = ()> {
    pub category: EndpointCategory,
    pub method: HttpMethod,
    pub path: String,
    pub payload: Option<Payload<B>>,
}

impl RequestSpec<()> {
    pub fn new(category: EndpointCategory, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            category,
            method,
            path: path.into(),
            payload: None,
        }
    }

    pub fn get(category: EndpointCategory, path: impl Into<String>) -> Self {
        Self::new(category, HttpMethod::Get, path)
    }

    pub fn post(category: EndpointCategory, path: impl Into<String>) -> Self {
        Self::new(category, HttpMethod::Post, path)
    }

    /// Attach an untyped body.
    pub fn untyped(mut self, payload: Payload<()>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach a typed body.
    pub fn typed<B: Serialize>(self, body: B) -> RequestSpec<B> {
        RequestSpec {
            category: self.category,
            method: self.method,
            path: self.path,
            payload: Some(Payload::Typed(body)),
        }
    }
}
