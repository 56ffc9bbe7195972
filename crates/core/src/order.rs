//! Order submission payloads.

use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartItem};
use crate::checkout::{CheckoutTotals, Discount};
use crate::types::{Email, OrderId, PaymentMethod, Price, ProductId};

/// Who the order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub city: String,
}

/// One ordered line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customization_selections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.unit_price,
            customization_selections: item.customization_selections.clone(),
            variant_name: item.variant_name.clone(),
        }
    }
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_info: CustomerInfo,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub subtotal: Price,
    pub shipping_fee: Price,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Price>,
}

impl OrderRequest {
    /// Assemble an order from the cart and its computed totals.
    ///
    /// The discount fields are only sent when a coupon actually took
    /// something off.
    #[must_use]
    pub fn new(
        customer_info: CustomerInfo,
        cart: &Cart,
        totals: &CheckoutTotals,
        payment_method: PaymentMethod,
        discount: Option<&Discount>,
    ) -> Self {
        let applied = discount.filter(|_| totals.discount > Price::ZERO);
        Self {
            customer_info,
            items: cart.items().iter().map(OrderItem::from).collect(),
            total_amount: totals.total,
            subtotal: totals.subtotal,
            shipping_fee: totals.shipping_fee,
            payment_method,
            discount_code: applied.map(|d| d.code.clone()),
            discount_amount: applied.map(|_| totals.discount),
        }
    }
}

/// Backend acknowledgement of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: OrderId,
}
