//! Credential handling with redacted Debug output.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// A bearer or refresh token that never exposes its value in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct RedactedToken {
    inner: String,
}

impl RedactedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            inner: token.into(),
        }
    }

    /// Get the actual token value.
    ///
    /// # Security Note
    /// Only call this when sending the token to the server or persisting it.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Token length (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for RedactedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedToken([REDACTED])")
    }
}

impl fmt::Display for RedactedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED TOKEN]")
    }
}

impl Drop for RedactedToken {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// Prevent accidental serialization
impl serde::Serialize for RedactedToken {
    #[track_caller]
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            message: String::from("RedactedToken cannot be serialized - use as_str() explicitly"),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
