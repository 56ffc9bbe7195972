//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Session-backed cart persistence and the applied coupon

pub mod cart;

pub use cart::{SessionCartStore, applied_discount, clear_discount, session_cart, store_discount};
