//! User-facing notices and navigation targets produced by the checkout flow.
//!
//! The flow never renders anything itself. It hands these values to the
//! presentation layer, which decides how to show them (banner, flash on the
//! next page, CLI log line).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message shown when the cart cannot be retrieved.
pub const LOAD_FAILURE_MESSAGE: &str = "No se pudo cargar tu carrito.";

/// Message shown when a visitor without a session opens checkout.
pub const SIGN_IN_MESSAGE: &str = "Debes iniciar sesión para continuar con el pago.";

/// Message shown when confirming with an empty cart.
pub const EMPTY_CART_MESSAGE: &str = "Tu carrito está vacío.";

/// Message shown when confirming without a payment method.
pub const MISSING_PAYMENT_MESSAGE: &str = "Selecciona un método de pago.";

/// What a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Cart retrieval failed.
    LoadFailure,
    /// No session identity.
    SignInRequired,
    /// Confirmation attempted with no lines.
    EmptyCart,
    /// Confirmation attempted without a payment method.
    MissingPayment,
    /// Order confirmation summary.
    OrderConfirmed,
}

impl NoticeKind {
    /// Whether the notice reports a problem rather than a success.
    #[must_use]
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::OrderConfirmed)
    }
}

/// A message for the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    /// Create a notice.
    #[must_use]
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A page the flow can send the visitor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Sign-in page.
    Login,
    /// Cart page.
    Cart,
}

impl Route {
    /// Storefront path for this route.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Cart => "/carrito",
        }
    }
}
