//! Checkout route handlers.
//!
//! `GET /checkout` starts a fresh [`CheckoutFlow`] and fetches the cart once.
//! The lines it got are kept in the session as a [`CheckoutSnapshot`] so the
//! summary and confirmation steps of the same visit reuse them instead of
//! fetching again. Confirmation is simulated: nothing is sent to the backend
//! and the cart is left as it is.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use hazel_lab_core::{DeliveryMethod, OrderTotals, PaymentMethod};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::{OptionalAuth, set_flash, take_flash};
use crate::models::{CheckoutSnapshot, CurrentUser, FlashNotice, keys};
use crate::routes::cart::CartView;
use crate::routes::products::NoticeTemplate;
use crate::services::checkout::{
    CheckoutFlow, CheckoutState, ConfirmOutcome, Notice, OrderConfirmation, Route,
};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Delivery or payment `<option>` display data.
#[derive(Clone)]
pub struct MethodOption {
    pub code: &'static str,
    pub label: &'static str,
    pub price: Option<String>,
    pub selected: bool,
}

fn delivery_options(selected: DeliveryMethod) -> Vec<MethodOption> {
    DeliveryMethod::ALL
        .into_iter()
        .map(|method| MethodOption {
            code: method.code(),
            label: method.label(),
            price: Some(if method.is_free() {
                "Gratis".to_string()
            } else {
                method.cost().to_string()
            }),
            selected: method == selected,
        })
        .collect()
}

fn payment_options(selected: PaymentMethod) -> Vec<MethodOption> {
    std::iter::once(PaymentMethod::Unselected)
        .chain(PaymentMethod::SELECTABLE)
        .map(|method| MethodOption {
            code: method.code(),
            label: method.label(),
            price: None,
            selected: method == selected,
        })
        .collect()
}

/// Order summary display data.
#[derive(Clone)]
pub struct SummaryView {
    pub delivery: String,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
}

impl SummaryView {
    fn new(totals: &OrderTotals, delivery: DeliveryMethod) -> Self {
        Self {
            delivery: delivery.label().to_string(),
            subtotal: totals.subtotal.to_string(),
            shipping: if totals.shipping_cost.is_zero() {
                "Gratis".to_string()
            } else {
                totals.shipping_cost.to_string()
            },
            total: totals.total.to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<FlashNotice>,
    pub notice: Option<FlashNotice>,
    pub signed_in: bool,
    pub ready: bool,
    pub cart: CartView,
    pub deliveries: Vec<MethodOption>,
    pub payments: Vec<MethodOption>,
    pub summary: SummaryView,
}

impl CheckoutTemplate {
    /// Render a flow. An explicit `notice` wins over the flow's own.
    fn new(
        flow: &CheckoutFlow,
        user: Option<CurrentUser>,
        flash: Option<FlashNotice>,
        notice: Option<Notice>,
    ) -> Self {
        Self {
            user,
            flash,
            notice: notice.or_else(|| flow.notice()).map(FlashNotice::from),
            signed_in: flow.session().is_some(),
            ready: matches!(flow.state(), CheckoutState::Ready { .. }),
            cart: CartView::from(flow.lines()),
            deliveries: delivery_options(flow.delivery()),
            payments: payment_options(flow.payment()),
            summary: SummaryView::new(&flow.totals(), flow.delivery()),
        }
    }
}

/// Order summary fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_summary.html")]
pub struct SummaryTemplate {
    pub summary: SummaryView,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmed.html")]
pub struct ConfirmedTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<FlashNotice>,
    pub headline: String,
    pub details: Vec<String>,
}

impl ConfirmedTemplate {
    fn new(order: &OrderConfirmation, user: Option<CurrentUser>) -> Self {
        let summary = order.summary();
        let mut lines = summary.lines().filter(|line| !line.trim().is_empty());
        Self {
            user,
            flash: None,
            headline: lines.next().unwrap_or_default().to_string(),
            details: lines.map(String::from).collect(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Delivery selection form data.
#[derive(Debug, Deserialize)]
pub struct SummaryForm {
    #[serde(default)]
    pub delivery: String,
}

/// Confirmation form data.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub delivery: String,
    #[serde(default)]
    pub payment: String,
}

fn parse_delivery(code: &str) -> Result<DeliveryMethod, AppError> {
    if code.trim().is_empty() {
        return Ok(DeliveryMethod::default());
    }
    Ok(code.parse()?)
}

fn parse_payment(code: &str) -> Result<PaymentMethod, AppError> {
    Ok(code.parse()?)
}

// =============================================================================
// Flow Helpers
// =============================================================================

/// Start a flow and fetch the cart, keeping the lines for later steps.
async fn enter_flow(
    state: &AppState,
    session: &Session,
    user: Option<&CurrentUser>,
) -> CheckoutFlow {
    let mut flow = CheckoutFlow::new(user.map(|u| u.id), state.coercion());
    flow.enter(state.backend()).await;

    if let (Some(user), CheckoutState::Ready { lines }) = (user, flow.state()) {
        let snapshot = CheckoutSnapshot {
            user_id: user.id,
            lines: lines.clone(),
        };
        if let Err(e) = session.insert(keys::CHECKOUT_SNAPSHOT, snapshot).await {
            tracing::warn!(error = %e, "Failed to store checkout snapshot");
        }
    }

    flow
}

/// Continue the visit's flow from the session snapshot, or start over when
/// there is none for this user.
async fn resume_flow(
    state: &AppState,
    session: &Session,
    user: Option<&CurrentUser>,
) -> CheckoutFlow {
    if let Some(user) = user {
        let snapshot = session
            .get::<CheckoutSnapshot>(keys::CHECKOUT_SNAPSHOT)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to read checkout snapshot");
                None
            });

        if let Some(snapshot) = snapshot.filter(|s| s.user_id == user.id) {
            return CheckoutFlow::resume(user.id, snapshot.lines, state.coercion());
        }
    }

    enter_flow(state, session, user).await
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let flow = enter_flow(&state, &session, user.as_ref()).await;
    let flash = take_flash(&session).await;
    CheckoutTemplate::new(&flow, user, flash, None)
}

/// Recompute the order summary for a delivery method (HTMX).
///
/// When the cart cannot be loaded the fragment is the load-failure notice,
/// never a summary priced on no lines.
///
/// # Errors
///
/// Returns `AppError::UnknownMethod` for an unknown delivery code.
#[instrument(skip(state, session, user))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<SummaryForm>,
) -> Result<Response, AppError> {
    let delivery = parse_delivery(&form.delivery)?;
    let mut flow = resume_flow(&state, &session, user.as_ref()).await;
    flow.select_delivery(delivery);

    // Only a flow that never reached `Ready` carries a notice
    if let Some(notice) = flow.notice() {
        return Ok(NoticeTemplate {
            notice: notice.into(),
        }
        .into_response());
    }

    Ok(SummaryTemplate {
        summary: SummaryView::new(&flow.totals(), flow.delivery()),
    }
    .into_response())
}

/// Confirm the order.
///
/// # Errors
///
/// Returns `AppError::UnknownMethod` for an unknown delivery or payment code.
#[instrument(skip(state, session, user))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<ConfirmForm>,
) -> Result<Response, AppError> {
    let delivery = parse_delivery(&form.delivery)?;
    let payment = parse_payment(&form.payment)?;

    let mut flow = resume_flow(&state, &session, user.as_ref()).await;
    flow.select_delivery(delivery);
    flow.select_payment(payment);

    match flow.confirm() {
        ConfirmOutcome::LoginRequired => Ok(Redirect::to(Route::Login.path()).into_response()),
        ConfirmOutcome::EmptyCart(notice) => {
            set_flash(&session, notice.into()).await;
            Ok(Redirect::to(Route::Cart.path()).into_response())
        }
        ConfirmOutcome::Unavailable(notice) | ConfirmOutcome::PaymentRequired(notice) => {
            Ok(CheckoutTemplate::new(&flow, user, None, Some(notice)).into_response())
        }
        ConfirmOutcome::Confirmed(order) => {
            tracing::info!(
                user_id = ?flow.session(),
                delivery = order.delivery.code(),
                payment = order.payment.code(),
                total = order.totals.total.pesos(),
                lines = flow.lines().len(),
                "Checkout confirmed (simulated, no order sent to backend)"
            );
            add_breadcrumb("checkout", "Order confirmed", None);
            session
                .remove::<CheckoutSnapshot>(keys::CHECKOUT_SNAPSHOT)
                .await?;
            Ok(ConfirmedTemplate::new(&order, user).into_response())
        }
    }
}
