//! Error types for token lifecycle and session operations.
//!
//! `RefreshTokenInvalid`, `RefreshTokenExpired` and `SessionExpired` are
//! terminal: the user has to log in again. Errors are `Clone` because a
//! single refresh result is handed to every caller waiting on it.

use crate::error::storage::StorageError;
use crate::error::transport::TransportError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, Clone, ThisError)]
pub enum SessionError {
    #[error("Refresh Token Invalid Error: {reason} {location}")]
    RefreshTokenInvalid {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Refresh Token Expired Error {location}")]
    RefreshTokenExpired { location: ErrorLocation },

    #[error("Session Expired Error: {reason} {location}")]
    SessionExpired {
        reason: String,
        #[source]
        cause: Option<Box<SessionError>>,
        location: ErrorLocation,
    },

    #[error("Malformed Token Error: {message} {location}")]
    MalformedToken {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    #[track_caller]
    pub fn refresh_token_invalid(reason: impl Into<String>) -> Self {
        SessionError::RefreshTokenInvalid {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn refresh_token_expired() -> Self {
        SessionError::RefreshTokenExpired {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn session_expired(reason: impl Into<String>, cause: Option<SessionError>) -> Self {
        SessionError::SessionExpired {
            reason: reason.into(),
            cause: cause.map(Box::new),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn malformed_token(message: impl Into<String>) -> Self {
        SessionError::MalformedToken {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether the session is gone and a fresh login is required.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionError::RefreshTokenInvalid { .. }
                | SessionError::RefreshTokenExpired { .. }
                | SessionError::SessionExpired { .. }
        )
    }

    pub fn error_code(&self) -> Option<u32> {
        match self {
            SessionError::Transport(e) => e.error_code(),
            SessionError::SessionExpired {
                cause: Some(cause), ..
            } => cause.error_code(),
            _ => None,
        }
    }

    /// Get error category for logging.
    pub fn error_category(&self) -> &'static str {
        match self {
            SessionError::RefreshTokenInvalid { .. } => "refresh_token_invalid",
            SessionError::RefreshTokenExpired { .. } => "refresh_token_expired",
            SessionError::SessionExpired { .. } => "session_expired",
            SessionError::MalformedToken { .. } => "malformed_token",
            SessionError::Transport(e) => e.error_category(),
            SessionError::Storage(_) => "storage",
        }
    }
}
