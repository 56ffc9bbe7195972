//! Checkout route handlers.
//!
//! The order summary is recomputed on every request from the session cart,
//! the backend's shipping rate table and the applied coupon. Prices in the
//! summary are never read back from the browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use siraj_core::cart::Cart;
use siraj_core::checkout::{CheckoutTotals, Discount};
use siraj_core::order::{CustomerInfo, OrderRequest};
use siraj_core::{Email, PaymentMethod, Price};
use tower_sessions::Session;
use tracing::instrument;

use super::cart::CartView;
use crate::backend::BackendError;
use crate::error::add_breadcrumb;
use crate::services::{applied_discount, clear_discount, session_cart, store_discount};
use crate::state::AppState;

/// Order summary display data for templates.
#[derive(Clone)]
pub struct SummaryView {
    pub city: String,
    pub subtotal: String,
    pub shipping_fee: String,
    pub free_shipping: bool,
    pub discount: Option<DiscountView>,
    pub total: String,
}

/// Applied coupon display data.
#[derive(Clone)]
pub struct DiscountView {
    pub code: String,
    pub label: String,
    pub amount: String,
}

impl SummaryView {
    fn new(city: &str, totals: &CheckoutTotals, discount: Option<&Discount>) -> Self {
        Self {
            city: city.to_string(),
            subtotal: totals.subtotal.display(),
            shipping_fee: totals.shipping_fee.display(),
            free_shipping: totals.shipping_fee == Price::ZERO,
            discount: discount.map(|d| DiscountView {
                code: d.code.clone(),
                label: d.label(),
                amount: totals.discount.display(),
            }),
            total: totals.total.display(),
        }
    }
}

/// Values typed into the checkout form, echoed back on re-render.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub payment_method: String,
}

impl CheckoutForm {
    /// Validate the customer fields.
    ///
    /// # Errors
    ///
    /// Returns every problem found, in form order.
    pub fn validate(&self) -> Result<(CustomerInfo, PaymentMethod), Vec<String>> {
        let mut problems = Vec::new();

        let required = [
            ("name", &self.name),
            ("phone number", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                problems.push(format!("Please enter your {label}."));
            }
        }

        let email = Email::parse(&self.email)
            .map_err(|e| problems.push(format!("Email: {e}.")))
            .ok();

        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|_| problems.push("Please choose a payment method.".to_string()))
            .ok();

        match (email, payment_method) {
            (Some(email), Some(payment_method)) if problems.is_empty() => Ok((
                CustomerInfo {
                    name: self.name.trim().to_string(),
                    email,
                    phone: self.phone.trim().to_string(),
                    address: self.address.trim().to_string(),
                    city: self.city.trim().to_string(),
                },
                payment_method,
            )),
            _ => Err(problems),
        }
    }
}

/// City selection query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CityParams {
    pub city: Option<String>,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct DiscountForm {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub city: String,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub summary: SummaryView,
    pub cities: Vec<String>,
    pub form: CheckoutForm,
    pub errors: Vec<String>,
    /// Summary fragment messages; empty on a full page render.
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Order summary fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_summary.html")]
pub struct CheckoutSummaryTemplate {
    pub summary: SummaryView,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order_id: String,
    pub customer_name: String,
    pub email: String,
    pub total: String,
    pub payment_method: &'static str,
}

/// Totals plus the city list, for one cart.
struct Pricing {
    totals: CheckoutTotals,
    cities: Vec<String>,
}

async fn price(state: &AppState, cart: &Cart, city: &str, discount: Option<&Discount>) -> Pricing {
    let rates = state.backend().get_shipping_rates().await;
    let totals = CheckoutTotals::compute(
        cart.total(),
        &state.config().shipping,
        city,
        rates.as_ref(),
        discount,
    );
    Pricing {
        totals,
        cities: rates
            .map(|r| r.cities().map(str::to_string).collect())
            .unwrap_or_default(),
    }
}

/// Display the checkout page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CityParams>,
) -> Response {
    let cart = session_cart(session.clone()).await;
    if cart.cart().is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let city = params.city.unwrap_or_default();
    let discount = applied_discount(&session).await;
    let pricing = price(&state, cart.cart(), &city, discount.as_ref()).await;

    CheckoutTemplate {
        cart: CartView::from(cart.cart()),
        summary: SummaryView::new(&city, &pricing.totals, discount.as_ref()),
        cities: pricing.cities,
        form: CheckoutForm {
            city,
            ..CheckoutForm::default()
        },
        errors: Vec::new(),
        notice: None,
        error: None,
    }
    .into_response()
}

/// Re-render the order summary for a city (HTMX).
#[instrument(skip(state, session))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CityParams>,
) -> impl IntoResponse {
    let cart = session_cart(session.clone()).await;
    let city = params.city.unwrap_or_default();
    let discount = applied_discount(&session).await;
    let pricing = price(&state, cart.cart(), &city, discount.as_ref()).await;

    CheckoutSummaryTemplate {
        summary: SummaryView::new(&city, &pricing.totals, discount.as_ref()),
        notice: None,
        error: None,
    }
}

/// Validate a coupon with the backend and keep it in the session (HTMX).
///
/// A blank code removes the applied coupon. A rejected code also removes it
/// so the summary never shows a discount the backend refused.
#[instrument(skip(state, session))]
pub async fn apply_discount(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<DiscountForm>,
) -> Result<Response, crate::error::AppError> {
    let cart = session_cart(session.clone()).await;
    let code = form.code.trim();

    let (status, discount, notice, error) = if code.is_empty() {
        clear_discount(&session).await?;
        (StatusCode::OK, None, Some("Discount removed.".to_string()), None)
    } else {
        match state.backend().validate_discount(code, cart.total()).await {
            Ok(discount) => {
                store_discount(&session, &discount).await?;
                add_breadcrumb("checkout", "Discount applied", &[("code", discount.code.as_str())]);
                let notice = format!("Code {} applied: {}", discount.code, discount.label());
                (StatusCode::OK, Some(discount), Some(notice), None)
            }
            Err(e) => {
                clear_discount(&session).await?;
                let status = match &e {
                    BackendError::Rejected(_) => {
                        tracing::info!(code, "Discount code rejected");
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    _ => {
                        tracing::error!(error = %e, "Failed to validate discount");
                        StatusCode::BAD_GATEWAY
                    }
                };
                (status, None, None, Some(e.user_message()))
            }
        }
    };

    let pricing = price(&state, cart.cart(), &form.city, discount.as_ref()).await;

    Ok((
        status,
        CheckoutSummaryTemplate {
            summary: SummaryView::new(&form.city, &pricing.totals, discount.as_ref()),
            notice,
            error,
        },
    )
        .into_response())
}

/// Place the order.
///
/// On success the cart and the coupon are cleared. On failure the form is
/// shown again with the backend's message and the cart is left intact.
#[instrument(skip(state, session, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let mut cart = session_cart(session.clone()).await;
    if cart.cart().is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let (discount, discount_problem) = recheck_discount(&state, &session, cart.total()).await;
    let pricing = price(&state, cart.cart(), &form.city, discount.as_ref()).await;

    let rerender = |status: StatusCode, errors: Vec<String>, form: CheckoutForm| {
        (
            status,
            CheckoutTemplate {
                cart: CartView::from(cart.cart()),
                summary: SummaryView::new(&form.city, &pricing.totals, discount.as_ref()),
                cities: pricing.cities.clone(),
                form,
                errors,
                notice: None,
                error: None,
            },
        )
            .into_response()
    };

    let (customer, payment_method) = match form.validate() {
        Ok(valid) => valid,
        Err(problems) => {
            tracing::warn!(problems = problems.len(), "Checkout form invalid");
            return rerender(StatusCode::UNPROCESSABLE_ENTITY, problems, form);
        }
    };
    if let Some((status, problem)) = discount_problem {
        return rerender(status, vec![problem], form);
    }

    let order = OrderRequest::new(
        customer,
        cart.cart(),
        &pricing.totals,
        payment_method,
        discount.as_ref(),
    );

    match state.backend().place_order(&order).await {
        Ok(confirmation) => {
            tracing::info!(order_id = %confirmation.order_id, "Order placed");
            add_breadcrumb(
                "checkout",
                "Order placed",
                &[("order_id", confirmation.order_id.as_str())],
            );

            cart.clear().await;
            if let Err(e) = clear_discount(&session).await {
                tracing::warn!(error = %e, "Failed to clear discount after order");
            }

            ConfirmationTemplate {
                order_id: confirmation.order_id.to_string(),
                customer_name: order.customer_info.name,
                email: order.customer_info.email.as_str().to_string(),
                total: order.total_amount.display(),
                payment_method: order.payment_method.label(),
            }
            .into_response()
        }
        Err(e) => {
            let status = match &e {
                BackendError::Rejected(_) => {
                    tracing::warn!(error = %e, "Order rejected");
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => {
                    tracing::error!(error = %e, "Failed to place order");
                    StatusCode::BAD_GATEWAY
                }
            };
            rerender(status, vec![e.user_message()], form)
        }
    }
}

/// Validate the stored coupon again against the current cart total.
///
/// The cart may have changed since the code was applied. A code the backend
/// now rejects is dropped from the session and reported so the customer sees
/// the new total before ordering. A backend failure keeps the code but still
/// blocks the order.
async fn recheck_discount(
    state: &AppState,
    session: &Session,
    cart_total: Price,
) -> (Option<Discount>, Option<(StatusCode, String)>) {
    let Some(stored) = applied_discount(session).await else {
        return (None, None);
    };

    match state.backend().validate_discount(&stored.code, cart_total).await {
        Ok(current) => {
            if current != stored {
                if let Err(e) = store_discount(session, &current).await {
                    tracing::warn!(error = %e, "Failed to store rechecked discount");
                }
            }
            (Some(current), None)
        }
        Err(BackendError::Rejected(message)) => {
            tracing::info!(code = %stored.code, "Applied discount no longer valid");
            if let Err(e) = clear_discount(session).await {
                tracing::warn!(error = %e, "Failed to clear discount");
            }
            let problem = format!("Discount {} was removed: {message}", stored.code);
            (None, Some((StatusCode::UNPROCESSABLE_ENTITY, problem)))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to recheck discount");
            (Some(stored), Some((StatusCode::BAD_GATEWAY, e.user_message())))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::Request};
    use rust_decimal::Decimal;
    use siraj_core::checkout::{DiscountKind, ShippingPolicy};
    use tower::ServiceExt;

    use super::*;
    use crate::routes::tests::test_app;

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Mona".to_string(),
            email: "mona@example.com".to_string(),
            phone: "01000000000".to_string(),
            address: "12 Nile St".to_string(),
            city: "Cairo".to_string(),
            payment_method: "cod".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let (customer, method) = form().validate().unwrap();
        assert_eq!(customer.city, "Cairo");
        assert_eq!(method, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_invalid_form_lists_every_problem() {
        let form = CheckoutForm {
            name: " ".to_string(),
            email: "not-an-email".to_string(),
            payment_method: "bitcoin".to_string(),
            ..form()
        };
        let problems = form.validate().unwrap_err();
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("name"));
    }

    #[test]
    fn test_summary_view_shows_clamped_discount() {
        let discount = Discount {
            code: "BIG".to_string(),
            kind: DiscountKind::Fixed(Decimal::from(1000)),
        };
        let totals = CheckoutTotals::compute(
            Price::from_pounds(300),
            &ShippingPolicy::default(),
            "Cairo",
            None,
            Some(&discount),
        );

        let view = SummaryView::new("Cairo", &totals, Some(&discount));
        assert_eq!(view.discount.unwrap().amount, "300.00 EGP");
        assert_eq!(view.total, "50.00 EGP");
        assert!(!view.free_shipping);
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_redirects() {
        let response = test_app()
            .oneshot(Request::get("/checkout").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/cart");
    }

    #[tokio::test]
    async fn test_place_order_with_empty_cart_redirects() {
        let response = test_app()
            .oneshot(
                Request::post("/checkout")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("name=Mona&email=mona%40example.com"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
