//! The checkout flow state machine.

use chrono::{DateTime, Utc};
use hazel_lab_core::{
    CartLine, CoercionPolicy, DeliveryMethod, OrderTotals, PaymentMethod, UserId, compute_totals,
};
use tracing::instrument;

use super::notice::{
    EMPTY_CART_MESSAGE, LOAD_FAILURE_MESSAGE, MISSING_PAYMENT_MESSAGE, Notice, NoticeKind, Route,
    SIGN_IN_MESSAGE,
};
use super::{CartProvider, retrieve_cart};

/// Where a checkout flow is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    /// Built, cart not fetched yet.
    Loading,
    /// No session identity. Terminal.
    Unauthenticated,
    /// Cart retrieval failed. Terminal.
    Error { message: String },
    /// Cart lines retrieved, possibly none.
    Ready { lines: Vec<CartLine> },
}

/// One visit to the checkout page.
///
/// The session identity is injected at construction; the flow never looks
/// it up on its own. Delivery and payment selections live only here.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    session: Option<UserId>,
    state: CheckoutState,
    delivery: DeliveryMethod,
    payment: PaymentMethod,
    policy: CoercionPolicy,
}

impl CheckoutFlow {
    /// Start a flow in `Loading`.
    #[must_use]
    pub fn new(session: Option<UserId>, policy: CoercionPolicy) -> Self {
        Self {
            session,
            state: CheckoutState::Loading,
            delivery: DeliveryMethod::default(),
            payment: PaymentMethod::default(),
            policy,
        }
    }

    /// Continue a flow whose cart was already retrieved earlier in the same
    /// visit. Starts in `Ready` with default selections.
    #[must_use]
    pub fn resume(session: UserId, lines: Vec<CartLine>, policy: CoercionPolicy) -> Self {
        Self {
            state: CheckoutState::Ready { lines },
            ..Self::new(Some(session), policy)
        }
    }

    /// Retrieve the cart and settle into a terminal state.
    ///
    /// Does nothing unless the flow is still `Loading`, so each flow fetches
    /// at most once. Failures are logged here and surface to the visitor
    /// only as the generic [`LOAD_FAILURE_MESSAGE`].
    #[instrument(skip(self, provider), fields(user_id = ?self.session))]
    pub async fn enter<P: CartProvider + Sync>(&mut self, provider: &P) {
        if self.state != CheckoutState::Loading {
            return;
        }

        let Some(user_id) = self.session else {
            self.state = CheckoutState::Unauthenticated;
            return;
        };

        self.state = match retrieve_cart(provider, user_id, self.policy).await {
            Ok(lines) => {
                tracing::debug!(lines = lines.len(), "Cart retrieved");
                CheckoutState::Ready { lines }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load cart for checkout");
                CheckoutState::Error {
                    message: LOAD_FAILURE_MESSAGE.to_string(),
                }
            }
        };
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Injected session identity.
    #[must_use]
    pub const fn session(&self) -> Option<UserId> {
        self.session
    }

    /// Cart lines; empty unless `Ready`.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        match &self.state {
            CheckoutState::Ready { lines } => lines,
            _ => &[],
        }
    }

    /// Selected delivery method.
    #[must_use]
    pub const fn delivery(&self) -> DeliveryMethod {
        self.delivery
    }

    /// Selected payment method.
    #[must_use]
    pub const fn payment(&self) -> PaymentMethod {
        self.payment
    }

    pub const fn select_delivery(&mut self, delivery: DeliveryMethod) {
        self.delivery = delivery;
    }

    pub const fn select_payment(&mut self, payment: PaymentMethod) {
        self.payment = payment;
    }

    /// Totals for the current lines and delivery method.
    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        compute_totals(self.lines(), self.delivery)
    }

    /// Notice to show for the current state, if any.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        match &self.state {
            CheckoutState::Unauthenticated => {
                Some(Notice::new(NoticeKind::SignInRequired, SIGN_IN_MESSAGE))
            }
            CheckoutState::Error { message } => {
                Some(Notice::new(NoticeKind::LoadFailure, message.clone()))
            }
            CheckoutState::Loading | CheckoutState::Ready { .. } => None,
        }
    }

    /// Try to confirm the order.
    ///
    /// Checks run in a fixed order and the first failure wins: session,
    /// then a loaded cart, then empty cart, then payment method. A flow whose
    /// cart never loaded is refused with the load-failure notice; it is not
    /// treated as empty. Nothing is sent to the backend.
    #[must_use]
    pub fn confirm(&self) -> ConfirmOutcome {
        if self.session.is_none() {
            return ConfirmOutcome::LoginRequired;
        }

        let lines = match &self.state {
            CheckoutState::Ready { lines } => lines,
            CheckoutState::Error { message } => {
                return ConfirmOutcome::Unavailable(Notice::new(
                    NoticeKind::LoadFailure,
                    message.clone(),
                ));
            }
            CheckoutState::Loading | CheckoutState::Unauthenticated => {
                return ConfirmOutcome::Unavailable(Notice::new(
                    NoticeKind::LoadFailure,
                    LOAD_FAILURE_MESSAGE,
                ));
            }
        };

        if lines.is_empty() {
            return ConfirmOutcome::EmptyCart(Notice::new(
                NoticeKind::EmptyCart,
                EMPTY_CART_MESSAGE,
            ));
        }

        if !self.payment.is_selected() {
            return ConfirmOutcome::PaymentRequired(Notice::new(
                NoticeKind::MissingPayment,
                MISSING_PAYMENT_MESSAGE,
            ));
        }

        ConfirmOutcome::Confirmed(OrderConfirmation {
            delivery: self.delivery,
            payment: self.payment,
            totals: self.totals(),
            confirmed_at: Utc::now(),
        })
    }
}

/// Result of [`CheckoutFlow::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// No session: go to the sign-in page.
    LoginRequired,
    /// The cart was never loaded: show the notice, stay on checkout.
    Unavailable(Notice),
    /// Nothing to buy: show the notice and go to the cart page.
    EmptyCart(Notice),
    /// No payment method: show the notice, stay on checkout.
    PaymentRequired(Notice),
    /// All checks passed.
    Confirmed(OrderConfirmation),
}

impl ConfirmOutcome {
    /// Where the visitor should be sent, if anywhere.
    #[must_use]
    pub const fn redirect(&self) -> Option<Route> {
        match self {
            Self::LoginRequired => Some(Route::Login),
            Self::EmptyCart(_) => Some(Route::Cart),
            Self::Unavailable(_) | Self::PaymentRequired(_) | Self::Confirmed(_) => None,
        }
    }

    /// Message for the visitor, if any.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::LoginRequired => None,
            Self::Unavailable(notice) | Self::EmptyCart(notice) | Self::PaymentRequired(notice) => {
                Some(notice.clone())
            }
            Self::Confirmed(order) => Some(Notice::new(NoticeKind::OrderConfirmed, order.summary())),
        }
    }
}

/// A confirmed (simulated) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub delivery: DeliveryMethod,
    pub payment: PaymentMethod,
    pub totals: OrderTotals,
    pub confirmed_at: DateTime<Utc>,
}

impl OrderConfirmation {
    /// Confirmation text shown to the visitor.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Proceso de compra completado exitosamente.\n\n\
             Método de envío: {}\n\
             Método de pago: {}\n\
             Total a pagar: {}",
            self.delivery.label(),
            self.payment.label(),
            self.totals.total
        )
    }
}
