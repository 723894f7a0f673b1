//! Request transport used by the token lifecycle and the session client.
//!
//! Callers only see JSON in and JSON out. A non-2xx answer comes back as
//! [`TransportError::Api`] carrying the server's payload untouched.

pub mod http;

pub use http::HttpTransport;

use crate::error::TransportError;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

pub const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Extra request headers. Authorization values are hidden from Debug output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authorization(value: impl Into<String>) -> Self {
        let mut headers = Self::new();
        headers.insert(AUTHORIZATION_HEADER, value);
        headers
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.entries.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, value)| {
                if name.eq_ignore_ascii_case(AUTHORIZATION_HEADER) {
                    (name.as_str(), "[REDACTED]")
                } else {
                    (name.as_str(), value.as_str())
                }
            }))
            .finish()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. `path` is relative to the API base URL.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: &Headers,
    ) -> Result<Value, TransportError>;

    async fn get(&self, path: &str, headers: &Headers) -> Result<Value, TransportError> {
        self.send(Method::Get, path, None, headers).await
    }

    async fn post(
        &self,
        path: &str,
        body: &Value,
        headers: &Headers,
    ) -> Result<Value, TransportError> {
        self.send(Method::Post, path, Some(body), headers).await
    }

    async fn patch(
        &self,
        path: &str,
        body: &Value,
        headers: &Headers,
    ) -> Result<Value, TransportError> {
        self.send(Method::Patch, path, Some(body), headers).await
    }

    async fn delete(
        &self,
        path: &str,
        body: Option<&Value>,
        headers: &Headers,
    ) -> Result<Value, TransportError> {
        self.send(Method::Delete, path, body, headers).await
    }
}
