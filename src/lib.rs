//! # Storefront
//!
//! Small HTTP store: CRUD over products and shopping carts, persisted to two flat JSON
//! files that act as the database.
//!
//! ## Entry points
//!
//! - [`ProductCatalog`]: products loaded once at startup, kept in memory, saved after each change.
//! - [`CartBook`]: carts re-read from disk and rewritten on every operation.
//! - [`api::create_router`]: the axum router over both, with `{ data | message | error }` envelopes.
//!
//! ## Example
//!
//! ```rust
//! use storefront::{Cart, CartId, ProductId};
//!
//! let mut cart = Cart::new(CartId::from("1"));
//! cart.add_product(ProductId::from("42"), 2);
//! assert!(cart.remove_product(&ProductId::from("42")).is_some());
//! assert!(cart.products.is_empty());
//! ```

pub mod api;
pub mod carts;
pub mod config;
pub mod error;
pub mod id_gen;
pub mod persistence;
pub mod products;
pub mod types;

pub use api::{create_router, AppState};
pub use carts::CartBook;
pub use config::AppConfig;
pub use error::{Resource, StoreError};
pub use id_gen::IdGenerator;
pub use persistence::{JsonStore, StorageError};
pub use products::{NewProduct, ProductCatalog, ProductPatch};
pub use types::{Cart, CartId, CartItem, Product, ProductId};
