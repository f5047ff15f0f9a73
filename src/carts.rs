//! Cart collection: no resident copy, every operation re-reads and rewrites the file.
//!
//! The read-modify-write cycle runs under one in-process mutex per [`CartBook`], so two
//! requests in this process cannot lose each other's updates. Other processes writing the
//! same file are not coordinated with.

use log::info;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::id_gen::IdGenerator;
use crate::persistence::JsonStore;
use crate::types::{Cart, CartId, CartItem, ProductId};

/// File-backed cart collection.
pub struct CartBook {
    store: JsonStore,
    /// Held for the whole read-modify-write cycle; wraps the id generator `create` needs.
    cycle: Mutex<IdGenerator>,
}

fn find_cart<'a>(carts: &'a mut [Cart], cart_id: &str) -> Result<&'a mut Cart, StoreError> {
    carts
        .iter_mut()
        .find(|c| c.id.0 == cart_id)
        .ok_or_else(|| StoreError::cart_not_found(cart_id))
}

impl CartBook {
    pub fn new(store: JsonStore, ids: IdGenerator) -> Self {
        Self {
            store,
            cycle: Mutex::new(ids),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Cart>, StoreError> {
        let _guard = self.cycle.lock().await;
        Ok(self.store.load().await?)
    }

    /// Appends an empty cart with a fresh id and returns it.
    pub async fn create(&self) -> Result<Cart, StoreError> {
        let mut ids = self.cycle.lock().await;
        let mut carts: Vec<Cart> = self.store.load().await?;
        let id = ids.next_unique(|candidate| carts.iter().any(|c| c.id.0 == candidate))?;
        let cart = Cart::new(CartId(id));
        carts.push(cart.clone());
        self.store.save(&carts).await?;
        info!("cart created id={} total_carts={}", cart.id, carts.len());
        Ok(cart)
    }

    pub async fn get_products(&self, cart_id: &str) -> Result<Vec<CartItem>, StoreError> {
        let _guard = self.cycle.lock().await;
        let mut carts: Vec<Cart> = self.store.load().await?;
        Ok(find_cart(&mut carts, cart_id)?.products.clone())
    }

    /// Adds `quantity` of `product_id` to the cart and returns the cart's products.
    /// The product id is not checked against the product collection.
    pub async fn add_product(
        &self,
        cart_id: &str,
        product_id: &str,
        quantity: u64,
    ) -> Result<Vec<CartItem>, StoreError> {
        let _guard = self.cycle.lock().await;
        let mut carts: Vec<Cart> = self.store.load().await?;
        let cart = find_cart(&mut carts, cart_id)?;
        cart.add_product(ProductId::from(product_id), quantity);
        let products = cart.products.clone();
        self.store.save(&carts).await?;
        info!(
            "product added to cart cart_id={} product_id={} quantity={}",
            cart_id, product_id, quantity
        );
        Ok(products)
    }

    /// Removes the line for `product_id` and returns the remaining products.
    pub async fn remove_product(
        &self,
        cart_id: &str,
        product_id: &str,
    ) -> Result<Vec<CartItem>, StoreError> {
        let _guard = self.cycle.lock().await;
        let mut carts: Vec<Cart> = self.store.load().await?;
        let cart = find_cart(&mut carts, cart_id)?;
        let product_id = ProductId::from(product_id);
        if cart.remove_product(&product_id).is_none() {
            return Err(StoreError::ProductNotInCart {
                cart_id: cart.id.clone(),
                product_id,
            });
        }
        let products = cart.products.clone();
        self.store.save(&carts).await?;
        info!(
            "product removed from cart cart_id={} product_id={}",
            cart_id, product_id
        );
        Ok(products)
    }
}
