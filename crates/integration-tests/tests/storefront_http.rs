//! End-to-end tests driving the storefront over HTTP.
//!
//! Mock-backed tests run by default. Smoke tests against a deployed
//! storefront are `#[ignore]`d and read `STOREFRONT_URL`.

#![allow(clippy::unwrap_used)]

use hazel_lab_core::CoercionPolicy;
use hazel_lab_integration_tests::{BAD_CREDENTIALS, Storefront};
use hazel_lab_storefront::routes::products::ADD_SIGN_IN_MESSAGE;
use hazel_lab_storefront::services::checkout::{
    EMPTY_CART_MESSAGE, LOAD_FAILURE_MESSAGE, MISSING_PAYMENT_MESSAGE, SIGN_IN_MESSAGE,
};
use reqwest::StatusCode;
use reqwest::header::LOCATION;

async fn storefront() -> Storefront {
    Storefront::start(CoercionPolicy::Lenient).await
}

fn location(response: &reqwest::Response) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

// =============================================================================
// Navigation
// =============================================================================

#[tokio::test]
async fn test_root_redirects_to_products() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let response = client.get(storefront.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/productos");
}

#[tokio::test]
async fn test_product_grid_filters_by_query() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let body = client
        .get(storefront.url("/productos?q=roble"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("Mesa de Roble"));
    assert!(body.contains("Vela Aromática"));
    assert!(!body.contains("Silla Nórdica"));
}

#[tokio::test]
async fn test_unfiltered_grid_shows_featured_strip() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let body = client
        .get(storefront.url("/productos"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Destacados"));
    assert!(body.contains("product-card-featured"));
    assert_eq!(storefront.backend.count("GET /api/productos/destacados"), 1);

    // A search hides the strip and skips the call
    let body = client
        .get(storefront.url("/productos?q=silla"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!body.contains("Destacados"));
    assert!(body.contains("Silla Nórdica"));
    assert_eq!(storefront.backend.count("GET /api/productos/destacados"), 1);
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let response = client.get(storefront.url("/login")).send().await.unwrap();
    let headers = response.headers();
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
}

// =============================================================================
// Sign-in
// =============================================================================

#[tokio::test]
async fn test_bad_login_rerenders_with_backend_message() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let response = client
        .post(storefront.url("/login"))
        .form(&[("email", "ana@duoc.cl"), ("password", "incorrecta")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains(BAD_CREDENTIALS));
    assert!(body.contains("ana@duoc.cl"));
}

#[tokio::test]
async fn test_add_to_cart_without_session_asks_to_sign_in() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let response = client
        .post(storefront.url("/productos/agregar"))
        .form(&[("producto_id", "4"), ("nombre", "Mesa de Roble")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains(ADD_SIGN_IN_MESSAGE));
    assert_eq!(storefront.backend.count("POST /api/itemscarrito"), 0);
}

#[tokio::test]
async fn test_add_to_cart_signals_cart_update() {
    let storefront = storefront().await;
    let client = Storefront::client();
    storefront.login(&client, "ana@duoc.cl").await;

    let response = client
        .post(storefront.url("/productos/agregar"))
        .form(&[("producto_id", "5"), ("nombre", "Silla Nórdica")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("hx-trigger").unwrap(), "cart-updated");
    assert!(response.text().await.unwrap().contains("Silla Nórdica"));
    assert_eq!(storefront.backend.count("POST /api/itemscarrito"), 1);
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_without_session_asks_to_sign_in() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let response = client.get(storefront.url("/checkout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains(SIGN_IN_MESSAGE));
    assert!(storefront.backend.requests().is_empty());
}

#[tokio::test]
async fn test_confirm_without_session_redirects_to_login() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let response = client
        .post(storefront.url("/checkout/confirmar"))
        .form(&[("delivery", "retiro"), ("payment", "tarjeta")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_checkout_happy_path() {
    let storefront = storefront().await;
    let client = Storefront::client();
    storefront.login(&client, "ana@duoc.cl").await;

    let page = client
        .get(storefront.url("/checkout"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Mesa de Roble"));
    assert!(page.contains("$120.000"));

    let summary = client
        .post(storefront.url("/checkout/resumen"))
        .form(&[("delivery", "estandar")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(summary.contains("$3.990"));
    assert!(summary.contains("$123.990"));

    let missing = client
        .post(storefront.url("/checkout/confirmar"))
        .form(&[("delivery", "estandar"), ("payment", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::OK);
    assert!(missing.text().await.unwrap().contains(MISSING_PAYMENT_MESSAGE));

    let confirmed = client
        .post(storefront.url("/checkout/confirmar"))
        .form(&[("delivery", "estandar"), ("payment", "tarjeta")])
        .send()
        .await
        .unwrap();
    assert_eq!(confirmed.status(), StatusCode::OK);
    let body = confirmed.text().await.unwrap();
    assert!(body.contains("Proceso de compra completado exitosamente."));
    assert!(body.contains("Envío estándar"));
    assert!(body.contains("$123.990"));

    // The checkout page entry is the only cart fetch; resumen and confirmar
    // reuse the session snapshot
    assert_eq!(storefront.backend.count("GET /api/itemscarrito/usuario/7"), 1);
}

#[tokio::test]
async fn test_confirm_empty_cart_flashes_on_cart_page() {
    let storefront = storefront().await;
    let client = Storefront::client();
    storefront.login(&client, "vacio@duoc.cl").await;

    let response = client
        .post(storefront.url("/checkout/confirmar"))
        .form(&[("delivery", "retiro"), ("payment", "efectivo")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/carrito");

    let cart = client
        .get(storefront.url("/carrito"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(cart.contains(EMPTY_CART_MESSAGE));
}

#[tokio::test]
async fn test_unknown_payment_code_is_bad_request() {
    let storefront = storefront().await;
    let client = Storefront::client();
    storefront.login(&client, "ana@duoc.cl").await;

    let response = client
        .post(storefront.url("/checkout/confirmar"))
        .form(&[("delivery", "retiro"), ("payment", "bitcoin")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_backend_failure_shows_generic_message() {
    let storefront = storefront().await;
    let client = Storefront::client();
    storefront.login(&client, "roto@duoc.cl").await;

    let body = client
        .get(storefront.url("/checkout"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("No se pudo cargar tu carrito."));
    assert!(!body.contains("NullPointerException"));
}

#[tokio::test]
async fn test_confirm_after_backend_failure_stays_on_checkout() {
    let storefront = storefront().await;
    let client = Storefront::client();
    storefront.login(&client, "roto@duoc.cl").await;

    let response = client
        .post(storefront.url("/checkout/confirmar"))
        .form(&[("delivery", "retiro"), ("payment", "tarjeta")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains(LOAD_FAILURE_MESSAGE));
    assert!(!body.contains(EMPTY_CART_MESSAGE));
    assert!(!body.contains("Proceso de compra completado"));

    // Nothing was flashed for the cart page either
    let cart = client
        .get(storefront.url("/carrito"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!cart.contains(EMPTY_CART_MESSAGE));
}

#[tokio::test]
async fn test_summary_after_backend_failure_has_no_totals() {
    let storefront = storefront().await;
    let client = Storefront::client();
    storefront.login(&client, "roto@duoc.cl").await;

    let body = client
        .post(storefront.url("/checkout/resumen"))
        .form(&[("delivery", "estandar")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(LOAD_FAILURE_MESSAGE));
    assert!(!body.contains("$0"));
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_page_uses_region_fallback() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let body = client
        .get(storefront.url("/registro"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Metropolitana"));
    assert!(body.contains("Magallanes"));
}

#[tokio::test]
async fn test_register_signs_in() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let response = client
        .post(storefront.url("/registro"))
        .form(&[
            ("run", "19011022K"),
            ("nombre", "Ana"),
            ("apellidos", "Pérez"),
            ("correo", "nueva@gmail.com"),
            ("region", "Metropolitana"),
            ("comuna", "Ñuñoa"),
            ("clave", "secreto1"),
            ("confirmar_clave", "secreto1"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let nav = client
        .get(storefront.url("/productos"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(nav.contains("Ana Pérez"));
}

#[tokio::test]
async fn test_register_validation_error_keeps_form() {
    let storefront = storefront().await;
    let client = Storefront::client();

    let response = client
        .post(storefront.url("/registro"))
        .form(&[
            ("run", "19011022K"),
            ("nombre", "Ana"),
            ("correo", "ana@hotmail.com"),
            ("clave", "secreto1"),
            ("confirmar_clave", "secreto1"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Solo @duoc.cl"));
    assert!(body.contains("19011022K"));
    assert_eq!(storefront.backend.count("POST /api/usuarios"), 0);
}

// =============================================================================
// Smoke Tests
// =============================================================================

fn deployed_url(path: &str) -> String {
    let base = std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    format!("{}{path}", base.trim_end_matches('/'))
}

#[tokio::test]
#[ignore = "requires a running storefront (STOREFRONT_URL)"]
async fn smoke_health() {
    let response = reqwest::get(deployed_url("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running storefront (STOREFRONT_URL)"]
async fn smoke_product_grid_renders() {
    let response = reqwest::get(deployed_url("/productos")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("<html"));
}
