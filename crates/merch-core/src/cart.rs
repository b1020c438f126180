//! ============================================================================
//! Cart Store - In-memory line items with change notification
//! ============================================================================
//! One CartStore is created by the composition root and shared by every
//! surface that shows or edits the cart. Items are keyed by (product object
//! id, size); quantity is always >= 1 while an item exists.
//!
//! Mutations are synchronous and apply in call order. Subscribers run right
//! after each mutation, outside the lock, so a callback may read the cart or
//! unsubscribe itself.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::types::Product;

/// A line in the cart. The product is a snapshot taken when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u64,
    #[serde(default)]
    pub size: Option<String>,
}

impl CartItem {
    fn matches(&self, object_id: &str, size: Option<&str>) -> bool {
        self.product.object_id == object_id && self.size.as_deref() == size
    }

    pub fn line_total(&self) -> u64 {
        self.product.price.saturating_mul(self.quantity)
    }
}

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&[CartItem]) + Send + Sync>;

/// Observable cart shared across the application
#[derive(Default)]
pub struct CartStore {
    items: RwLock<Vec<CartItem>>,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of a product. Same product and size merge into one line.
    /// A zero quantity changes nothing.
    pub fn add_to_cart(&self, product: &Product, quantity: u64, size: Option<&str>) {
        if quantity == 0 {
            return;
        }

        {
            let mut items = self.write_items();
            match items
                .iter_mut()
                .find(|item| item.matches(&product.object_id, size))
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(quantity);
                    debug!("Cart: {} x{} (now {})", product.name, quantity, existing.quantity);
                }
                None => {
                    items.push(CartItem {
                        product: product.clone(),
                        quantity,
                        size: size.map(str::to_string),
                    });
                    debug!("Cart: added {} x{}", product.name, quantity);
                }
            }
        }

        self.notify();
    }

    /// Set the quantity of an existing line. Negative values clamp to zero and
    /// zero removes the line. Unknown lines are ignored without notification.
    pub fn update_quantity(&self, object_id: &str, quantity: i64, size: Option<&str>) {
        let quantity = u64::try_from(quantity).unwrap_or(0);

        let changed = {
            let mut items = self.write_items();
            match items.iter().position(|item| item.matches(object_id, size)) {
                Some(index) if quantity == 0 => {
                    items.remove(index);
                    debug!("Cart: removed {} (quantity 0)", object_id);
                    true
                }
                Some(index) => {
                    if let Some(item) = items.get_mut(index) {
                        item.quantity = quantity;
                    }
                    debug!("Cart: {} quantity set to {}", object_id, quantity);
                    true
                }
                None => false,
            }
        };

        if changed {
            self.notify();
        }
    }

    /// Remove a line if present
    pub fn remove_from_cart(&self, object_id: &str, size: Option<&str>) {
        let removed = {
            let mut items = self.write_items();
            let before = items.len();
            items.retain(|item| !item.matches(object_id, size));
            before != items.len()
        };

        if removed {
            debug!("Cart: removed {}", object_id);
            self.notify();
        }
    }

    pub fn clear_cart(&self) {
        self.write_items().clear();
        debug!("Cart: cleared");
        self.notify();
    }

    /// Copy of the current lines in insertion order
    pub fn items(&self) -> Vec<CartItem> {
        self.read_items().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.read_items().is_empty()
    }

    /// Sum of all quantities
    pub fn total_items(&self) -> u64 {
        self.read_items()
            .iter()
            .fold(0u64, |sum, item| sum.saturating_add(item.quantity))
    }

    /// Sum of price x quantity, in MIST
    pub fn total_price(&self) -> u64 {
        self.read_items()
            .iter()
            .fold(0u64, |sum, item| sum.saturating_add(item.line_total()))
    }

    /// Register a callback invoked with the new items after every mutation
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&[CartItem]) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        before != listeners.len()
    }

    fn notify(&self) {
        let snapshot = self.items();
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(&snapshot);
        }
    }

    fn read_items(&self) -> RwLockReadGuard<'_, Vec<CartItem>> {
        self.items.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_items(&self) -> RwLockWriteGuard<'_, Vec<CartItem>> {
        self.items.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
