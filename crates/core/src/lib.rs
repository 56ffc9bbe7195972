//! Siraj Core - Shared domain library.
//!
//! This crate provides the domain model used across all Siraj components:
//! - `storefront` - Public-facing shop (browsing, cart, checkout)
//! - `admin` - Product upload form
//! - `cli` - Command-line tools for catalog management
//!
//! # Architecture
//!
//! The core crate contains only types, pure logic and traits - no HTTP
//! clients and no web framework. Cart persistence is injected through the
//! [`cart::CartStore`] trait so the cart can be tested without a browser
//! session.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`product`] - Catalog products (`Single` / `Bundle`) and admin drafts
//! - [`cart`] - Cart line items, the cart reducer and the cart manager
//! - [`checkout`] - Shipping, discount and order total computation
//! - [`order`] - Order placement payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod order;
pub mod product;
pub mod types;

pub use types::*;
