use crate::error::transport::ApiError;
use crate::error_catalog::ErrorCode;

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

const NOT_A_NUMBER_MESSAGE: &str = "Value needs to be a number";

/// Input rejected on the client before any request is sent.
#[derive(Debug, Clone, ThisError)]
pub enum ValidationError {
    #[error("Validation Error: {code} {message} {location}")]
    InvalidAmount {
        code: ErrorCode,
        message: String,
        location: ErrorLocation,
    },
}

impl ValidationError {
    #[track_caller]
    pub fn not_a_number(code: ErrorCode) -> Self {
        ValidationError::InvalidAmount {
            code,
            message: NOT_A_NUMBER_MESSAGE.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn error_code(&self) -> u32 {
        match self {
            ValidationError::InvalidAmount { code, .. } => code.as_u32(),
        }
    }

    pub fn status_code(&self) -> HttpStatusCode {
        HttpStatusCode::CLIENT_VALIDATION
    }

    /// Same shape as a server error, so callers can treat both alike.
    pub fn to_api_error(&self) -> ApiError {
        match self {
            ValidationError::InvalidAmount { code, message, .. } => {
                ApiError::new(code.as_u32(), message.clone(), self.status_code().0)
            }
        }
    }
}
