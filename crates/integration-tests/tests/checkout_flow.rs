//! Integration tests for the checkout flow against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use hazel_lab_core::{Clp, CoercionPolicy, DeliveryMethod, PaymentMethod, UserId};
use hazel_lab_integration_tests::MockBackend;
use hazel_lab_storefront::backend::BackendClient;
use hazel_lab_storefront::services::checkout::{
    CheckoutFlow, CheckoutState, ConfirmOutcome, EMPTY_CART_MESSAGE, LOAD_FAILURE_MESSAGE,
    MISSING_PAYMENT_MESSAGE, Route,
};

async fn entered(user: Option<i64>, policy: CoercionPolicy) -> (MockBackend, CheckoutFlow) {
    let backend = MockBackend::start().await;
    let client = BackendClient::new(&backend.config()).unwrap();

    let mut flow = CheckoutFlow::new(user.map(UserId::new), policy);
    flow.enter(&client).await;
    (backend, flow)
}

#[tokio::test]
async fn test_full_checkout_confirms_with_totals() {
    let (backend, mut flow) = entered(Some(7), CoercionPolicy::Lenient).await;

    assert_eq!(flow.lines().len(), 2);
    // Stringly-typed numbers in the payload are coerced
    assert_eq!(flow.lines()[1].product.cost, Clp::new(20_000));
    assert_eq!(flow.totals().total, Clp::new(120_000));

    flow.select_delivery(DeliveryMethod::Express);
    assert_eq!(flow.totals().total, Clp::new(126_990));

    flow.select_payment(PaymentMethod::BankTransfer);
    let ConfirmOutcome::Confirmed(order) = flow.confirm() else {
        panic!("expected a confirmed order");
    };

    assert_eq!(order.totals.shipping_cost, Clp::new(6_990));
    assert!(order.summary().contains("Total a pagar: $126.990"));
    assert!(order.summary().contains("Método de pago: Transferencia bancaria"));

    // One fetch, and confirmation never touches the backend
    assert_eq!(backend.count("GET /api/itemscarrito/usuario/7"), 1);
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_missing_payment_blocks_confirmation() {
    let (_backend, flow) = entered(Some(7), CoercionPolicy::Lenient).await;

    let outcome = flow.confirm();
    assert_eq!(outcome.redirect(), None);
    assert_eq!(outcome.notice().unwrap().message, MISSING_PAYMENT_MESSAGE);
}

#[tokio::test]
async fn test_empty_cart_redirects_to_cart() {
    let (_backend, mut flow) = entered(Some(8), CoercionPolicy::Lenient).await;

    assert_eq!(flow.state(), &CheckoutState::Ready { lines: Vec::new() });
    assert_eq!(flow.totals().total, Clp::ZERO);

    flow.select_payment(PaymentMethod::Card);
    let outcome = flow.confirm();
    assert_eq!(outcome.redirect(), Some(Route::Cart));
    assert_eq!(outcome.notice().unwrap().message, EMPTY_CART_MESSAGE);
}

#[tokio::test]
async fn test_backend_failure_is_generic_error() {
    let (_backend, flow) = entered(Some(9), CoercionPolicy::Lenient).await;

    let CheckoutState::Error { message } = flow.state() else {
        panic!("expected error state, got {:?}", flow.state());
    };
    assert_eq!(message, LOAD_FAILURE_MESSAGE);
    assert!(!message.contains("NullPointerException"));

    // Never mistaken for an empty cart
    let mut flow = flow;
    flow.select_payment(PaymentMethod::Card);
    let outcome = flow.confirm();
    assert!(matches!(outcome, ConfirmOutcome::Unavailable(_)));
    assert_eq!(outcome.redirect(), None);
    assert_eq!(outcome.notice().unwrap().message, LOAD_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_html_cart_body_reads_as_empty_cart() {
    let (backend, flow) = entered(Some(11), CoercionPolicy::Strict).await;

    assert_eq!(flow.state(), &CheckoutState::Ready { lines: Vec::new() });
    assert_eq!(backend.count("GET /api/itemscarrito/usuario/11"), 1);
}

#[tokio::test]
async fn test_coercion_policy_decides_bad_cost() {
    let (_backend, lenient) = entered(Some(10), CoercionPolicy::Lenient).await;
    assert_eq!(lenient.lines().len(), 1);
    assert_eq!(lenient.totals().subtotal, Clp::ZERO);

    let (_backend, strict) = entered(Some(10), CoercionPolicy::Strict).await;
    assert!(matches!(strict.state(), CheckoutState::Error { .. }));
}

#[tokio::test]
async fn test_no_session_never_calls_backend() {
    let (backend, flow) = entered(None, CoercionPolicy::Lenient).await;

    assert_eq!(flow.state(), &CheckoutState::Unauthenticated);
    assert_eq!(flow.confirm().redirect(), Some(Route::Login));
    assert!(backend.requests().is_empty());
}
