//! Core records for the store: products, carts, and their identifiers.
//!
//! Identifiers are newtype wrappers over the numeric-looking strings that appear in the
//! JSON files. [`Product`] and [`Cart`] are the on-disk shapes of the two collections.

use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::{Number, Value};
use std::fmt;

/// Product identifier. Unique within the product collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ProductId(pub String);

/// Cart identifier. Its namespace is independent of [`ProductId`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct CartId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        ProductId(s.to_string())
    }
}

impl From<&str> for CartId {
    fn from(s: &str) -> Self {
        CartId(s.to_string())
    }
}

/// Catalog entry.
///
/// `price` and `stock` keep the exact JSON number they were written with, so a file
/// holding `"stock": 10` is rewritten as `10`, not `10.0`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub code: String,
    pub price: Number,
    pub status: bool,
    pub stock: Number,
    pub category: String,
}

/// One line of a cart: a product reference and how many of it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: u64,
}

/// Reads a JSON number as a whole, non-negative quantity. `2.0` counts as `2`; `1.5` and
/// negatives do not.
pub fn whole_quantity(value: &Value) -> Option<u64> {
    if let Some(q) = value.as_u64() {
        return Some(q);
    }
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0).then(|| f as u64)
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    whole_quantity(&value).ok_or_else(|| D::Error::custom(format!("invalid quantity {}", value)))
}

/// Shopping cart. Product ids are unique within `products`; order is insertion order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub products: Vec<CartItem>,
}

impl Cart {
    pub fn new(id: CartId) -> Self {
        Self {
            id,
            products: Vec::new(),
        }
    }

    /// Adds `quantity` of `product_id`. An existing line is incremented rather than duplicated.
    ///
    /// ```rust
    /// use storefront::{Cart, CartId, ProductId};
    ///
    /// let mut cart = Cart::new(CartId::from("7"));
    /// cart.add_product(ProductId::from("42"), 2);
    /// cart.add_product(ProductId::from("42"), 3);
    /// assert_eq!(cart.products.len(), 1);
    /// assert_eq!(cart.products[0].quantity, 5);
    /// ```
    pub fn add_product(&mut self, product_id: ProductId, quantity: u64) {
        match self.products.iter_mut().find(|item| item.id == product_id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.products.push(CartItem {
                id: product_id,
                quantity,
            }),
        }
    }

    /// Removes the line for `product_id`. Returns the removed line, or `None` if absent.
    pub fn remove_product(&mut self, product_id: &ProductId) -> Option<CartItem> {
        let idx = self.products.iter().position(|item| &item.id == product_id)?;
        Some(self.products.remove(idx))
    }
}
