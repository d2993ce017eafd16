//! Cart route handlers.
//!
//! Quantity changes and removals use HTMX and answer with the refreshed
//! `cart_items` fragment. Lines go through the same sanitation as checkout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use hazel_lab_core::{CartLine, CartLineId, DeliveryMethod, compute_totals};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::PLACEHOLDER_IMAGE;
use crate::middleware::{RequireAuth, take_flash};
use crate::models::{CheckoutSnapshot, CurrentUser, FlashNotice, keys};
use crate::services::checkout::{LOAD_FAILURE_MESSAGE, retrieve_cart};
use crate::state::AppState;

/// Quantity update with a value below 1.
pub const INVALID_QUANTITY_MESSAGE: &str = "La cantidad debe ser al menos 1.";

/// Backend rejected a quantity update.
pub const UPDATE_FAILURE_MESSAGE: &str = "No se pudo actualizar la cantidad.";

/// Backend rejected a removal.
pub const REMOVE_FAILURE_MESSAGE: &str = "No se pudo eliminar el producto del carrito.";

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub unit_price: String,
    pub subtotal: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.product.name.clone(),
            image: line
                .product
                .image
                .clone()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            quantity: line.quantity,
            unit_price: line.product.cost.to_string(),
            subtotal: line.subtotal().to_string(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(&[] as &[CartLine])
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&[CartLine]> for CartView {
    fn from(lines: &[CartLine]) -> Self {
        // Pickup is free, so this is the plain line sum
        let totals = compute_totals(lines, DeliveryMethod::Pickup);
        Self {
            lines: lines.iter().map(CartLineView::from).collect(),
            subtotal: totals.subtotal.to_string(),
            item_count: lines
                .iter()
                .fold(0_u32, |count, line| count.saturating_add(line.quantity)),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<FlashNotice>,
    pub cart: CartView,
    pub load_error: Option<String>,
    /// Always `None` on the full page; shared with the items fragment.
    pub notice: Option<FlashNotice>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub notice: Option<FlashNotice>,
}

// =============================================================================
// Forms
// =============================================================================

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Fetch the user's cart as a view, or the load-failure message.
async fn load_cart(state: &AppState, user: &CurrentUser) -> Result<CartView, String> {
    match retrieve_cart(state.backend(), user.id, state.coercion()).await {
        Ok(lines) => Ok(CartView::from(lines.as_slice())),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart");
            Err(LOAD_FAILURE_MESSAGE.to_string())
        }
    }
}

/// Re-render the items fragment after a mutation.
async fn items_fragment(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    notice: Option<FlashNotice>,
) -> Response {
    // The cart changed, so a checkout snapshot taken earlier is stale
    if let Err(e) = session
        .remove::<CheckoutSnapshot>(keys::CHECKOUT_SNAPSHOT)
        .await
    {
        tracing::warn!(error = %e, "Failed to drop checkout snapshot");
    }

    let (cart, notice) = match load_cart(state, user).await {
        Ok(cart) => (cart, notice),
        Err(message) => (CartView::empty(), Some(FlashNotice::error(message))),
    };

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart, notice },
    )
        .into_response()
}

/// Display cart page.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    let (cart, load_error) = match load_cart(&state, &user).await {
        Ok(cart) => (cart, None),
        Err(message) => (CartView::empty(), Some(message)),
    };

    CartShowTemplate {
        flash: take_flash(&session).await,
        user: Some(user),
        cart,
        load_error,
        notice: None,
    }
}

/// Update cart line quantity (HTMX).
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    if form.quantity < 1 {
        return items_fragment(
            &state,
            &session,
            &user,
            Some(FlashNotice::error(INVALID_QUANTITY_MESSAGE)),
        )
        .await;
    }

    let line_id = CartLineId::new(form.line_id);
    let notice = match state
        .backend()
        .update_cart_item(&line_id, form.quantity)
        .await
    {
        Ok(()) => None,
        Err(e) => {
            tracing::error!(error = %e, line_id = %line_id, "Failed to update cart line");
            Some(FlashNotice::error(UPDATE_FAILURE_MESSAGE))
        }
    };

    items_fragment(&state, &session, &user, notice).await
}

/// Remove a cart line (HTMX).
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let line_id = CartLineId::new(form.line_id);
    let notice = match state.backend().remove_cart_item(&line_id).await {
        Ok(()) => None,
        Err(e) => {
            tracing::error!(error = %e, line_id = %line_id, "Failed to remove cart line");
            Some(FlashNotice::error(REMOVE_FAILURE_MESSAGE))
        }
    };

    items_fragment(&state, &session, &user, notice).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use hazel_lab_core::Clp;

    use super::*;

    #[test]
    fn test_cart_view_from_lines() {
        let lines = vec![
            CartLine::new("1", "Mesa", Clp::new(50_000), 2),
            CartLine::new("2", "Silla", Clp::new(20_000), 1),
        ];

        let view = CartView::from(lines.as_slice());

        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "$120.000");
        assert_eq!(view.lines[0].subtotal, "$100.000");
        assert_eq!(view.lines[0].unit_price, "$50.000");
        assert_eq!(view.lines[0].image, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::empty();
        assert!(view.is_empty());
        assert_eq!(view.subtotal, "$0");
        assert_eq!(view.item_count, 0);
    }
}
