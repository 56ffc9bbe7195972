//! Session-related types.
//!
//! The cart and the applied coupon live in the visitor's session; nothing
//! else about the visitor is stored server-side.

/// Session keys for storefront state.
pub mod keys {
    /// Key for the serialized cart (a JSON array of cart items).
    pub const CART: &str = "cart";

    /// Key for the coupon applied on the checkout page.
    pub const DISCOUNT: &str = "discount";
}
