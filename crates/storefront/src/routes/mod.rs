//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to the product grid
//!
//! # Products
//! GET  /productos              - Product grid (?categoria=&q= filters)
//! POST /productos/agregar      - Add to cart (HTMX, returns a notice fragment)
//!
//! # Cart (requires auth)
//! GET  /carrito                - Cart page
//! POST /carrito/actualizar     - Update quantity (returns cart_items fragment)
//! POST /carrito/eliminar       - Remove line (returns cart_items fragment)
//!
//! # Checkout
//! GET  /checkout               - Checkout page (fetches the cart once)
//! POST /checkout/resumen       - Order summary for a delivery method (HTMX)
//! POST /checkout/confirmar     - Confirm the order
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! POST /logout                 - Logout action
//! GET  /registro               - Registration page
//! POST /registro               - Registration action
//! GET  /registro/comunas       - Comuna options for a region (HTMX)
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod registration;

use axum::{
    Router,
    handler::Handler,
    response::Redirect,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, cart_rate_limiter};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/agregar", post(products::add).layer(cart_rate_limiter()))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/actualizar", post(cart::update).layer(cart_rate_limiter()))
        .route("/eliminar", post(cart::remove).layer(cart_rate_limiter()))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/resumen", post(checkout::summary))
        .route("/confirmar", post(checkout::confirm))
}

/// Create the registration routes router.
pub fn registration_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(registration::register_page)
                .post(registration::register.layer(auth_rate_limiter())),
        )
        .route("/comunas", get(registration::comunas))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/productos") }))
        .nest("/productos", product_routes())
        .nest("/carrito", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/registro", registration_routes())
        .route(
            "/login",
            get(auth::login_page).post(auth::login.layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}
