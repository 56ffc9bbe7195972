//! Cart state plus persistence.

use std::future::Future;
use std::sync::Mutex;

use super::{Cart, CartItem, CartLineId, QuantityChange};
use crate::types::Price;

/// Where a cart lives between requests.
///
/// Implementations must tolerate a missing cart (`Ok(None)`); a cart that
/// cannot be read is reported as an error and the manager starts empty.
pub trait CartStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load(&self) -> impl Future<Output = Result<Option<Cart>, Self::Error>> + Send;

    fn save(&self, cart: &Cart) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// What a mutation did, for toasts and the `HX-Trigger` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    ItemAdded {
        line_id: CartLineId,
        name: String,
        quantity: u32,
    },
    ItemRemoved {
        line_id: CartLineId,
    },
    QuantityUpdated {
        line_id: CartLineId,
        quantity: u32,
    },
    Cleared,
    /// The mutation referenced a line that is not in the cart.
    Unchanged,
}

impl CartEvent {
    /// Whether the cart changed.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// User-facing confirmation message.
    #[must_use]
    pub fn notification(&self) -> Option<String> {
        match self {
            Self::ItemAdded { name, quantity, .. } => {
                Some(format!("Added {quantity} × {name} to your cart"))
            }
            Self::ItemRemoved { .. } => Some("Item removed from your cart".to_owned()),
            Self::QuantityUpdated { .. } => Some("Cart updated".to_owned()),
            Self::Cleared => Some("Your cart is empty".to_owned()),
            Self::Unchanged => None,
        }
    }
}

/// A cart bound to its store.
///
/// Every mutation updates the in-memory cart first and then writes the
/// whole cart back. Persistence failures are logged and swallowed: the
/// current request still sees the updated cart.
#[derive(Debug)]
pub struct CartManager<S> {
    cart: Cart,
    store: S,
}

impl<S: CartStore> CartManager<S> {
    /// Load the cart from `store`, starting empty if it is missing or
    /// unreadable.
    pub async fn hydrate(store: S) -> Self {
        let cart = match store.load().await {
            Ok(Some(cart)) => cart.normalized(),
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "stored cart unreadable, starting empty");
                Cart::new()
            }
        };
        Self { cart, store }
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.cart.total()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    /// Add `quantity` of `item` (0 counts as 1).
    pub async fn add_item(&mut self, item: CartItem, quantity: u32) -> CartEvent {
        let quantity = quantity.max(1);
        let line = self.cart.add(item, quantity);
        let event = CartEvent::ItemAdded {
            line_id: line.line_id().clone(),
            name: line.name.clone(),
            quantity,
        };
        self.persist().await;
        event
    }

    /// Remove a line. Removing a missing line is a no-op.
    pub async fn remove_item(&mut self, line_id: &CartLineId) -> CartEvent {
        if !self.cart.remove(line_id) {
            return CartEvent::Unchanged;
        }
        self.persist().await;
        CartEvent::ItemRemoved {
            line_id: line_id.clone(),
        }
    }

    /// Set a line's quantity; `quantity <= 0` removes the line.
    pub async fn update_quantity(&mut self, line_id: &CartLineId, quantity: i64) -> CartEvent {
        let event = match self.cart.update_quantity(line_id, quantity) {
            QuantityChange::NotFound => return CartEvent::Unchanged,
            QuantityChange::Removed => CartEvent::ItemRemoved {
                line_id: line_id.clone(),
            },
            QuantityChange::Updated => CartEvent::QuantityUpdated {
                line_id: line_id.clone(),
                quantity: self.cart.get(line_id).map_or(0, |item| item.quantity),
            },
        };
        self.persist().await;
        event
    }

    /// Empty the cart and the store.
    pub async fn clear(&mut self) -> CartEvent {
        self.cart.clear();
        if let Err(e) = self.store.clear().await {
            tracing::warn!(error = %e, "failed to clear stored cart");
        }
        CartEvent::Cleared
    }

    async fn persist(&self) {
        if let Err(e) = self.store.save(&self.cart).await {
            tracing::warn!(error = %e, items = self.cart.items().len(), "failed to persist cart");
        }
    }
}

/// Error from [`MemoryCartStore`].
#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("cart serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("cart store lock poisoned")]
    Poisoned,
}

/// In-process store holding the cart as a JSON string.
///
/// Mirrors a browser's string key/value storage, which makes it useful for
/// tests and for tools that need a throwaway cart.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with raw JSON (which may be invalid).
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    /// The raw stored JSON, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl CartStore for MemoryCartStore {
    type Error = MemoryStoreError;

    async fn load(&self) -> Result<Option<Cart>, Self::Error> {
        let raw = self.raw_slot()?;
        raw.map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(Into::into)
    }

    async fn save(&self, cart: &Cart) -> Result<(), Self::Error> {
        let json = serde_json::to_string(cart)?;
        let mut slot = self.slot.lock().map_err(|_| MemoryStoreError::Poisoned)?;
        *slot = Some(json);
        Ok(())
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        let mut slot = self.slot.lock().map_err(|_| MemoryStoreError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

impl MemoryCartStore {
    fn raw_slot(&self) -> Result<Option<String>, MemoryStoreError> {
        self.slot
            .lock()
            .map(|slot| slot.clone())
            .map_err(|_| MemoryStoreError::Poisoned)
    }
}
