//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session; every mutation answers with a
//! fragment plus an `HX-Trigger: cart-updated` header so the header badge
//! refreshes itself.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use siraj_core::ProductId;
use siraj_core::cart::{Cart, CartEvent, CartItem, CartLineId, parse_quantity};
use siraj_core::product::Selection;
use siraj_core::product::draft::MAX_BUNDLE_ITEMS;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::add_breadcrumb;
use crate::services::session_cart;
use crate::state::AppState;

/// Event name sent in `HX-Trigger` after every cart change.
pub const CART_UPDATED: &str = "cart-updated";

/// Prefix of the per-item scent fields on a bundle's add-to-cart form.
pub const BUNDLE_SCENT_FIELD: &str = "bundle_scent_";

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub line_id: String,
    pub product_url: String,
    pub name: String,
    pub variant_name: Option<String>,
    pub customization: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            line_id: item.line_id().as_str().to_string(),
            product_url: format!("/products/{}", item.id),
            name: item.name.clone(),
            variant_name: item.variant_name.clone(),
            customization: (!item.customization_selections.is_empty())
                .then(|| item.customization_selections.join(", ")),
            quantity: item.quantity,
            unit_price: item.unit_price.display(),
            line_total: item.line_total().display(),
            image_url: item.image_url.clone(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            subtotal: cart.total().display(),
            item_count: cart.item_count(),
        }
    }
}

/// Add to cart form data.
///
/// Parsed from raw pairs because bundle scents arrive as a numbered family
/// of fields (`bundle_scent_0`, `bundle_scent_1`, ...).
#[derive(Debug, Default)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
    pub selection: Selection,
}

impl AddToCartForm {
    /// Build the form from submitted field pairs. Unknown fields are ignored.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        let mut bundle_scents = Vec::new();

        for (key, value) in pairs {
            match key.as_str() {
                "product_id" => form.product_id = value,
                "quantity" => form.quantity = Some(value),
                "variant" => form.selection.variant = Some(value),
                "scent" => form.selection.scent = Some(value),
                "size" => form.selection.size = Some(value),
                other => {
                    let index = other
                        .strip_prefix(BUNDLE_SCENT_FIELD)
                        .and_then(|i| i.parse::<usize>().ok())
                        .filter(|i| *i < MAX_BUNDLE_ITEMS);
                    if let Some(index) = index {
                        bundle_scents.push((index, value));
                    }
                }
            }
        }

        let len = bundle_scents.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
        form.selection.bundle_scents = vec![String::new(); len];
        for (index, value) in bundle_scents {
            if let Some(slot) = form.selection.bundle_scents.get_mut(index) {
                *slot = value;
            }
        }
        form
    }

    /// Requested quantity: at least 1, at most `max`.
    #[must_use]
    pub fn quantity(&self, max: u32) -> u32 {
        let requested = self.quantity.as_deref().map_or(1, parse_quantity).max(1);
        u32::try_from(requested).unwrap_or(u32::MAX).min(max.max(1))
    }
}

/// Update cart form data.
///
/// `quantity` stays text: anything that is not a positive number removes
/// the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub notice: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub notice: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Add-to-cart outcome fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/add_result.html")]
pub struct AddResultTemplate {
    pub success: bool,
    pub message: String,
}

impl AddResultTemplate {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> impl IntoResponse {
    let cart = session_cart(session).await;

    CartShowTemplate {
        cart: CartView::from(cart.cart()),
        notice: None,
    }
}

/// Add item to cart (HTMX).
///
/// Name and price come from the catalog, never from the form. A selection
/// the product does not accept is answered with 422 and nothing is added.
#[instrument(skip(state, session, pairs))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = AddToCartForm::from_pairs(pairs);
    if form.product_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            AddResultTemplate::failure("Please choose a product."),
        )
            .into_response();
    }

    let product_id = ProductId::new(form.product_id.trim());
    let product = match state.backend().get_product(&product_id).await {
        Ok(product) => product,
        Err(e) => {
            let status = match &e {
                BackendError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            };
            tracing::error!(error = %e, product_id = %product_id, "Failed to load product for cart");
            return (status, AddResultTemplate::failure(e.user_message())).into_response();
        }
    };

    let options = match product.select(&form.selection) {
        Ok(options) => options,
        Err(e) => {
            tracing::warn!(product_id = %product_id, reason = %e, "Add to cart blocked");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                AddResultTemplate::failure(capitalize(&e.to_string())),
            )
                .into_response();
        }
    };

    let quantity = form.quantity(product.max_quantity());
    let mut cart = session_cart(session).await;
    let event = cart
        .add_item(CartItem::from_selection(&product, options), quantity)
        .await;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[("product_id", product_id.as_str())],
    );

    (
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        AddResultTemplate {
            success: true,
            message: event.notification().unwrap_or_default(),
        },
    )
        .into_response()
}

/// Update cart item quantity (HTMX).
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Response {
    let mut cart = session_cart(session).await;
    let event = cart
        .update_quantity(&CartLineId::new(form.line_id), parse_quantity(&form.quantity))
        .await;

    items_fragment(&event, cart.cart())
}

/// Remove item from cart (HTMX).
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Response {
    let mut cart = session_cart(session).await;
    let event = cart.remove_item(&CartLineId::new(form.line_id)).await;

    items_fragment(&event, cart.cart())
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let cart = session_cart(session).await;

    CartCountTemplate {
        count: cart.item_count(),
    }
}

/// Cart items fragment, with the refresh trigger only when the cart changed.
fn items_fragment(event: &CartEvent, cart: &Cart) -> Response {
    let fragment = CartItemsTemplate {
        cart: CartView::from(cart),
        notice: event.notification(),
    };

    if event.is_change() {
        (AppendHeaders([("HX-Trigger", CART_UPDATED)]), fragment).into_response()
    } else {
        fragment.into_response()
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
