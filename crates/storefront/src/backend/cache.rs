//! Cache types for backend responses.

use siraj_core::checkout::ShippingRates;
use siraj_core::product::{Category, Product};

use super::query::{ListQuery, Listing, Page};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(String),
    Page(Listing, ListQuery),
    Categories,
    ShippingRates,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Page(Page<Product>),
    Categories(Vec<Category>),
    ShippingRates(ShippingRates),
}
