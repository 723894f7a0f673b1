use crate::error::CartError;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitType {
    /// Sold by weight, price per kilogram.
    Weight,
    /// Sold by piece.
    Count,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Weight => "WEIGHT",
            UnitType::Count => "COUNT",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = CartError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WEIGHT" => Ok(UnitType::Weight),
            "COUNT" => Ok(UnitType::Count),
            other => Err(CartError::invalid_unit_type(other)),
        }
    }
}

/// One line of the cart. `name` is unique within a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub name: String,
    pub unit_type: UnitType,
    /// Two-decimal fixed representation, e.g. `"2.50"`.
    pub unit_price: String,
    pub quantity: i64,
}
