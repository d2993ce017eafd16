//! Checkout flow controller.
//!
//! Owns cart retrieval, derived pricing, delivery/payment selection and the
//! confirmation gate. The cart comes from a [`CartProvider`]; in production
//! that is the backend REST client, in tests an in-memory fake.
//!
//! # Lifecycle
//!
//! ```text
//! Loading ──enter()──┬─> Unauthenticated   (no session identity)
//!                    ├─> Error             (retrieval failed)
//!                    └─> Ready { lines }   (possibly empty)
//! ```
//!
//! A flow never goes back to `Loading`; a new visit builds a new flow.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut flow = CheckoutFlow::new(Some(user_id), CoercionPolicy::Lenient);
//! flow.enter(&backend).await;
//!
//! flow.select_delivery(DeliveryMethod::Standard);
//! flow.select_payment(PaymentMethod::Card);
//!
//! match flow.confirm() {
//!     ConfirmOutcome::Confirmed(order) => println!("{}", order.summary()),
//!     other => redirect_or_show(other),
//! }
//! ```

mod flow;
mod notice;

pub use flow::{CheckoutFlow, CheckoutState, ConfirmOutcome, OrderConfirmation};
pub use notice::{
    EMPTY_CART_MESSAGE, LOAD_FAILURE_MESSAGE, MISSING_PAYMENT_MESSAGE, Notice, NoticeKind, Route,
    SIGN_IN_MESSAGE,
};

use std::fmt::Display;
use std::future::Future;

use hazel_lab_core::{CartLine, CoercionPolicy, SanitizeError, UserId, sanitize_lines};
use serde_json::Value;
use thiserror::Error;

/// Source of a user's cart lines.
///
/// Returns the raw payload; sanitation happens in [`retrieve_cart`] so every
/// provider gets the same coercion rules.
pub trait CartProvider {
    /// Provider-specific failure. Only its `Display` form is used, for logs.
    type Error: Display + Send;

    /// Fetch the raw cart payload for `user_id`.
    fn fetch_cart_lines(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Value, Self::Error>> + Send;
}

/// Why a cart could not be retrieved.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The provider failed (transport or server error).
    #[error("cart provider failed: {0}")]
    Provider(String),

    /// The payload was rejected under the strict coercion policy.
    #[error("malformed cart payload: {0}")]
    Malformed(#[from] SanitizeError),
}

/// Fetch and sanitise the cart lines of a user.
///
/// A payload that is not a JSON array yields an empty cart. No retry.
///
/// # Errors
///
/// Returns [`RetrievalError::Provider`] if the provider fails, and
/// [`RetrievalError::Malformed`] if a line is rejected under
/// [`CoercionPolicy::Strict`].
pub async fn retrieve_cart<P: CartProvider + Sync>(
    provider: &P,
    user_id: UserId,
    policy: CoercionPolicy,
) -> Result<Vec<CartLine>, RetrievalError> {
    let body = provider
        .fetch_cart_lines(user_id)
        .await
        .map_err(|e| RetrievalError::Provider(e.to_string()))?;

    Ok(sanitize_lines(&body, policy)?)
}
