//! Cart persistence in the visitor session.
//!
//! The whole cart is written back under one key after every mutation, so a
//! reload (or a second tab) sees exactly what the last request left.

use siraj_core::cart::{Cart, CartManager, CartStore};
use siraj_core::checkout::Discount;
use tower_sessions::Session;

use crate::models::session_keys;

/// [`CartStore`] backed by a tower-sessions [`Session`].
#[derive(Debug, Clone)]
pub struct SessionCartStore {
    session: Session,
}

impl SessionCartStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartStore for SessionCartStore {
    type Error = tower_sessions::session::Error;

    async fn load(&self) -> Result<Option<Cart>, Self::Error> {
        self.session.get::<Cart>(session_keys::CART).await
    }

    async fn save(&self, cart: &Cart) -> Result<(), Self::Error> {
        self.session.insert(session_keys::CART, cart).await
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        self.session
            .remove::<serde_json::Value>(session_keys::CART)
            .await
            .map(|_| ())
    }
}

/// Load the visitor's cart.
pub async fn session_cart(session: Session) -> CartManager<SessionCartStore> {
    CartManager::hydrate(SessionCartStore::new(session)).await
}

/// The coupon applied on the checkout page, if any.
pub async fn applied_discount(session: &Session) -> Option<Discount> {
    match session.get::<Discount>(session_keys::DISCOUNT).await {
        Ok(discount) => discount,
        Err(e) => {
            tracing::warn!(error = %e, "stored discount unreadable, ignoring");
            None
        }
    }
}

/// Remember an accepted coupon.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn store_discount(
    session: &Session,
    discount: &Discount,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::DISCOUNT, discount).await
}

/// Forget the applied coupon.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn clear_discount(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<serde_json::Value>(session_keys::DISCOUNT)
        .await
        .map(|_| ())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use siraj_core::cart::CartItem;
    use siraj_core::checkout::DiscountKind;
    use siraj_core::{Price, ProductId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn candle() -> CartItem {
        CartItem::new(
            ProductId::new("p1"),
            "Rose Jar",
            Price::from_pounds(250),
            "/img/rose.jpg",
        )
    }

    #[tokio::test]
    async fn test_cart_survives_rehydration() {
        let session = session();

        let mut cart = session_cart(session.clone()).await;
        cart.add_item(candle(), 2).await;

        let reloaded = session_cart(session).await;
        assert_eq!(reloaded.item_count(), 2);
        assert_eq!(reloaded.total(), Price::from_pounds(500));
    }

    #[tokio::test]
    async fn test_malformed_cart_starts_empty() {
        let session = session();
        session
            .insert(session_keys::CART, serde_json::json!({"not": "a cart"}))
            .await
            .unwrap();

        let cart = session_cart(session).await;
        assert!(cart.cart().is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_stored_cart() {
        let session = session();
        let mut cart = session_cart(session.clone()).await;
        cart.add_item(candle(), 1).await;
        cart.clear().await;

        let stored: Option<serde_json::Value> = session.get(session_keys::CART).await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_discount_roundtrip() {
        let session = session();
        let discount = Discount {
            code: "EID10".to_string(),
            kind: DiscountKind::Percentage(Decimal::TEN),
        };

        store_discount(&session, &discount).await.unwrap();
        assert_eq!(applied_discount(&session).await, Some(discount));

        clear_discount(&session).await.unwrap();
        assert_eq!(applied_discount(&session).await, None);
    }
}
