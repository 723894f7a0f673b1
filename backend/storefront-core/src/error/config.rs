use std::panic::Location;
use std::path::{Path, PathBuf};

use common::ErrorLocation;
use thiserror::Error;

/// Failures loading, saving or checking the storefront client settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Client Config Read Error: cannot read {path}: {source} {location}")]
    Unreadable {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Client Config Parse Error: {path} is not a client config: {reason} {location}")]
    Malformed {
        location: ErrorLocation,
        path: PathBuf,
        reason: String,
    },

    #[error("Client Config Write Error: cannot write {path}: {source} {location}")]
    Unwritable {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storefront Data Directory Error: no local data directory on this platform {location}")]
    NoDataDirectory { location: ErrorLocation },

    #[error("Client Config Encode Error: {reason} {location}")]
    Encode {
        location: ErrorLocation,
        reason: String,
    },

    #[error("Client Config Validation Error: {field}: {reason} {location}")]
    Invalid {
        location: ErrorLocation,
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn unreadable(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Unreadable {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source,
        }
    }

    #[track_caller]
    pub fn malformed(path: &Path, reason: impl ToString) -> Self {
        ConfigError::Malformed {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    #[track_caller]
    pub fn unwritable(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Unwritable {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source,
        }
    }

    #[track_caller]
    pub fn no_data_directory() -> Self {
        ConfigError::NoDataDirectory {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn encode(reason: impl ToString) -> Self {
        ConfigError::Encode {
            location: ErrorLocation::from(Location::caller()),
            reason: reason.to_string(),
        }
    }

    #[track_caller]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            location: ErrorLocation::from(Location::caller()),
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending setting for validation failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}
