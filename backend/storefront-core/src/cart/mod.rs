//! Shopping cart persisted through a [`KeyValueStore`].
//!
//! The whole item list is written back on every mutation, and the in-memory
//! list only changes once that write succeeds. A missing or unreadable
//! persisted cart loads as an empty one.

pub mod item;
pub mod parse;

pub use item::{CartItem, UnitType};

use crate::error::{CartError, StorageError};
use crate::storage::KeyValueStore;
use crate::storage::keys::CART;

use std::sync::{Arc, Mutex};

use log::{debug, warn};

/// A cart shared between the UI side and the session client.
pub type SharedCart = Arc<Mutex<CartStore>>;

pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
    items: Vec<CartItem>,
}

impl CartStore {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let items = match store.get(CART) {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Persisted cart is unreadable, starting empty: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };

        debug!("Cart loaded with {} item(s)", items.len());
        Self { store, items }
    }

    pub fn into_shared(self) -> SharedCart {
        Arc::new(Mutex::new(self))
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get(&self, name: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `name`, or replace unit type, price and quantity if it exists.
    ///
    /// # Errors
    ///
    /// Rejects an unknown unit type, a price or quantity without a numeric
    /// prefix, leaving the cart unchanged. Returns [`CartError::Storage`] if
    /// the updated cart cannot be persisted.
    pub fn add_item(
        &mut self,
        name: &str,
        unit_type: &str,
        unit_price: &str,
        quantity: &str,
    ) -> Result<(), CartError> {
        let unit_type: UnitType = unit_type.parse()?;
        let unit_price = parse::parse_price(unit_price)
            .map(parse::to_fixed_2)
            .ok_or_else(|| CartError::invalid_price(unit_price))?;
        let quantity =
            parse::parse_quantity(quantity).ok_or_else(|| CartError::invalid_quantity(quantity))?;

        let mut items = self.items.clone();
        match items.iter_mut().find(|item| item.name == name) {
            Some(item) => {
                item.unit_type = unit_type;
                item.unit_price = unit_price;
                item.quantity = quantity;
            }
            None => items.push(CartItem {
                name: name.to_string(),
                unit_type,
                unit_price,
                quantity,
            }),
        }

        self.replace(items)
    }

    /// Removing a name that is not in the cart is a no-op.
    pub fn remove_item(&mut self, name: &str) -> Result<(), CartError> {
        let items = self
            .items
            .iter()
            .filter(|item| item.name != name)
            .cloned()
            .collect();
        self.replace(items)
    }

    /// Sum of `unit_price × quantity`, as a two-decimal string.
    pub fn total_price(&self) -> String {
        let total = self
            .items
            .iter()
            .map(|item| {
                let unit_price = parse::parse_price(&item.unit_price).unwrap_or_else(|| {
                    warn!("Item '{}' has unreadable price '{}'", item.name, item.unit_price);
                    0.0
                });
                unit_price * item.quantity as f64
            })
            .fold(0.0, |total, line| total + line);

        parse::to_fixed_2(total)
    }

    pub fn clear(&mut self) -> Result<(), CartError> {
        self.replace(Vec::new())
    }

    /// Persist `items`, then make them the cart. On error the cart is unchanged.
    fn replace(&mut self, items: Vec<CartItem>) -> Result<(), CartError> {
        let json = serde_json::to_string(&items).map_err(StorageError::serialize)?;
        self.store.set(CART, &json)?;
        self.items = items;
        Ok(())
    }
}
