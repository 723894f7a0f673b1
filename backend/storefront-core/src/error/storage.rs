use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};

use thiserror::Error as ThisError;

#[derive(Debug, Clone, ThisError)]
pub enum StorageError {
    #[error("Storage Read Error: {path}: {message} {location}")]
    Read {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("Storage Parse Error: {path}: {message} {location}")]
    Parse {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("Storage Write Error: {path}: {message} {location}")]
    Write {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("Storage Serialization Error: {message} {location}")]
    Serialize {
        message: String,
        location: ErrorLocation,
    },
}

impl StorageError {
    #[track_caller]
    pub fn read(path: &Path, error: impl ToString) -> Self {
        StorageError::Read {
            path: path.to_path_buf(),
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn parse(path: &Path, error: impl ToString) -> Self {
        StorageError::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn write(path: &Path, error: impl ToString) -> Self {
        StorageError::Write {
            path: path.to_path_buf(),
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn serialize(error: impl ToString) -> Self {
        StorageError::Serialize {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
