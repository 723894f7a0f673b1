use crate::error::storage::StorageError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Why a cart mutation was refused.
///
/// Rejected input never touches the cart or the persisted copy.
#[derive(Debug, Clone, ThisError)]
pub enum CartError {
    #[error("Cart Unit Type Error: '{value}' is not WEIGHT or COUNT {location}")]
    InvalidUnitType {
        value: String,
        location: ErrorLocation,
    },

    #[error("Cart Price Error: '{value}' is not a number {location}")]
    InvalidPrice {
        value: String,
        location: ErrorLocation,
    },

    #[error("Cart Quantity Error: '{value}' is not an integer {location}")]
    InvalidQuantity {
        value: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CartError {
    #[track_caller]
    pub fn invalid_unit_type(value: impl Into<String>) -> Self {
        CartError::InvalidUnitType {
            value: value.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_price(value: impl Into<String>) -> Self {
        CartError::InvalidPrice {
            value: value.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_quantity(value: impl Into<String>) -> Self {
        CartError::InvalidQuantity {
            value: value.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// True for input rejections, false when persisting failed.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, CartError::Storage(_))
    }
}
