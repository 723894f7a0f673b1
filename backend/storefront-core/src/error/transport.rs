//! Error types for the HTTP transport.
//!
//! Non-2xx responses keep the server's structured payload untouched in
//! [`ApiError`] so that presentation layers can translate `error_code`.

use common::{ErrorLocation, HttpStatusCode};

use std::fmt;
use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error as ThisError;

const DEFAULT_API_ERROR_STATUS: u16 = 450;

/// Structured error body returned by the storefront API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error_code: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub details: Vec<Value>,
}

fn default_status() -> u16 {
    DEFAULT_API_ERROR_STATUS
}

impl ApiError {
    pub fn new(error_code: u32, message: impl Into<String>, status: u16) -> Self {
        Self {
            error_code,
            message: message.into(),
            status,
            details: Vec::new(),
        }
    }

    pub fn status_code(&self) -> HttpStatusCode {
        HttpStatusCode(self.status)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (HTTP {}): {}", self.error_code, self.status, self.message)
    }
}

#[derive(Debug, Clone, ThisError)]
pub enum TransportError {
    #[error("API Error: {error} {location}")]
    Api {
        error: ApiError,
        location: ErrorLocation,
    },

    #[error("HTTP Error: {message} {location}")]
    Http {
        message: String,
        is_timeout: bool,
        is_connection: bool,
        location: ErrorLocation,
    },

    #[error("JSON Error: {message} {location}")]
    Json {
        message: String,
        location: ErrorLocation,
    },

    #[error("URL Parse Error: {message} {location}")]
    UrlParse {
        message: String,
        location: ErrorLocation,
    },
}

impl TransportError {
    #[track_caller]
    pub fn api(error: ApiError) -> Self {
        TransportError::Api {
            error,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn json(message: impl Into<String>) -> Self {
        TransportError::Json {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// The server payload, if the failure was a non-2xx response.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            TransportError::Api { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<u32> {
        self.api_error().map(|e| e.error_code)
    }

    pub fn status_code(&self) -> Option<HttpStatusCode> {
        self.api_error().map(ApiError::status_code)
    }

    /// Get error category for logging.
    pub fn error_category(&self) -> &'static str {
        match self {
            TransportError::Api { error, .. } if error.status_code().is_client_error() => {
                "client_error"
            }
            TransportError::Api { error, .. } if error.status_code().is_server_error() => {
                "server_error"
            }
            TransportError::Api { .. } => "api",
            TransportError::Http {
                is_timeout: true, ..
            } => "timeout",
            TransportError::Http {
                is_connection: true,
                ..
            } => "connection",
            TransportError::Http { .. } => "network",
            TransportError::Json { .. } => "json",
            TransportError::UrlParse { .. } => "url",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        // Check for specific error types BEFORE converting to string
        let is_timeout = error.is_timeout();
        let is_connection = error.is_connect();

        if error.is_decode() {
            return TransportError::Json {
                message: error.to_string(),
                location: ErrorLocation::from(Location::caller()),
            };
        }

        TransportError::Http {
            message: error.to_string(),
            is_timeout,
            is_connection,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for TransportError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        TransportError::UrlParse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        TransportError::Json {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
