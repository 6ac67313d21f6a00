//! Shopper-side cart with best-effort persistence.
//!
//! Every mutation updates the in-memory aggregate first and then tries to
//! write it to disk. A failed write is logged and swallowed: the cart stays
//! usable for the session, and the shopper never sees a storage error
//! mid-interaction.

use std::path::{Path, PathBuf};

use storefront_types::domain::cart::{Cart, CartLine};
use uuid::Uuid;

pub struct CartStore {
    cart: Cart,
    path: PathBuf,
}

impl CartStore {
    /// Opens the cart persisted at `path`. A missing or unreadable file
    /// starts an empty cart rather than failing.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let cart = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(cart) => cart,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "corrupt cart file, starting empty");
                    Cart::new()
                }
            },
            Err(_) => Cart::new(),
        };
        Self { cart, path }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.cart.lines
    }

    pub fn count(&self) -> u32 {
        self.cart.count()
    }

    pub fn add_line(&mut self, product_id: Uuid, qty: u32, size: Option<String>, color: Option<String>) {
        self.cart.add_line(product_id, qty, size, color);
        self.persist();
    }

    pub fn remove_line(&mut self, product_id: Uuid, size: Option<&str>, color: Option<&str>) {
        self.cart.remove_line(product_id, size, color);
        self.persist();
    }

    pub fn update_quantity(&mut self, product_id: Uuid, qty: u32, size: Option<&str>, color: Option<&str>) {
        self.cart.update_quantity(product_id, qty, size, color);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.persist();
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.cart) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(%err, "failed to serialize cart");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, raw) {
            tracing::warn!(path = %self.path.display(), %err, "failed to persist cart");
        }
    }
}
