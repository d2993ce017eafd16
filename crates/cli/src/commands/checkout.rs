//! Checkout command.
//!
//! Runs the same flow the storefront runs: fetch the cart once, price it for
//! the chosen delivery method, then try to confirm. Confirmation is simulated,
//! so nothing is written to the backend.
//!
//! # Environment Variables
//!
//! - `HAZEL_API_URL` - Backend base URL (default `http://localhost:8080/api`)
//! - `HAZEL_API_TIMEOUT_SECS` - Optional request timeout

use hazel_lab_core::{CoercionPolicy, DeliveryMethod, PaymentMethod, UnknownMethod, UserId};
use hazel_lab_storefront::services::checkout::{CheckoutFlow, CheckoutState, ConfirmOutcome};
use thiserror::Error;

use super::{BackendSetupError, backend_client};

/// Errors that can occur during a checkout run.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Could not reach a usable backend client.
    #[error(transparent)]
    Setup(#[from] BackendSetupError),

    /// Delivery or payment code not recognised.
    #[error(transparent)]
    Method(#[from] UnknownMethod),

    /// The flow stopped with a message for the customer.
    #[error("{0}")]
    Rejected(String),
}

/// Run a checkout for `user_id`.
///
/// # Errors
///
/// Returns an error if a method code is unknown, the cart cannot be loaded,
/// or the confirmation gate refuses the order.
pub async fn run(
    user_id: i64,
    delivery: &str,
    payment: &str,
    strict: bool,
) -> Result<(), CheckoutError> {
    let delivery: DeliveryMethod = delivery.parse()?;
    let payment: PaymentMethod = payment.parse()?;
    let policy = if strict {
        CoercionPolicy::Strict
    } else {
        CoercionPolicy::Lenient
    };

    let client = backend_client()?;

    let mut flow = CheckoutFlow::new(Some(UserId::new(user_id)), policy);
    flow.enter(&client).await;

    if let CheckoutState::Error { message } = flow.state() {
        return Err(CheckoutError::Rejected(message.clone()));
    }

    for line in flow.lines() {
        tracing::info!(
            "  {} x{} @ {} = {}",
            line.product.name,
            line.quantity,
            line.product.cost,
            line.subtotal()
        );
    }

    flow.select_delivery(delivery);
    flow.select_payment(payment);

    let totals = flow.totals();
    tracing::info!(
        "Subtotal {} + envío {} ({}) = {}",
        totals.subtotal,
        totals.shipping_cost,
        delivery.label(),
        totals.total
    );

    let outcome = flow.confirm();
    match &outcome {
        ConfirmOutcome::Confirmed(order) => {
            for line in order.summary().lines().filter(|l| !l.trim().is_empty()) {
                tracing::info!("{line}");
            }
            Ok(())
        }
        ConfirmOutcome::LoginRequired
        | ConfirmOutcome::Unavailable(_)
        | ConfirmOutcome::EmptyCart(_)
        | ConfirmOutcome::PaymentRequired(_) => {
            let message = outcome
                .notice()
                .map_or_else(|| "login required".to_string(), |n| n.message);
            Err(CheckoutError::Rejected(message))
        }
    }
}
