//! Product grid route handlers.
//!
//! The grid is filtered in the storefront, not by the backend: the full
//! catalogue is fetched (and cached by the client) and narrowed down with
//! [`CatalogFilter`]. The unfiltered page also opens with a strip of the
//! backend's featured products.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{AppendHeaders, IntoResponse, Response},
};
use hazel_lab_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{BackendError, Category, Product};
use crate::error::add_breadcrumb;
use crate::middleware::{OptionalAuth, take_flash};
use crate::models::{CurrentUser, FlashNotice};
use crate::services::catalog::{ALL_CATEGORIES, CatalogFilter};
use crate::state::AppState;

/// Shown instead of the grid when the catalogue cannot be fetched.
pub const PRODUCTS_LOAD_FAILURE: &str = "No se pudieron cargar los productos desde el servidor.";

/// Add-to-cart attempted without a session.
pub const ADD_SIGN_IN_MESSAGE: &str = "Debes iniciar sesión para agregar productos al carrito.";

/// Backend answered 401 to add-to-cart.
pub const ADD_SESSION_EXPIRED_MESSAGE: &str =
    "Sesión expirada. Por favor, inicia sesión nuevamente.";

/// Backend answered 404 to add-to-cart.
pub const ADD_NOT_FOUND_MESSAGE: &str = "Producto no encontrado.";

/// Any other add-to-cart failure.
pub const ADD_FAILURE_MESSAGE: &str = "No se pudo agregar el producto al carrito.";

// =============================================================================
// View Types
// =============================================================================

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub category: Option<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.display_name().to_string(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price().to_string(),
            image: product.image_url().to_string(),
            category: product.category.as_ref().map(|c| c.nombre.clone()),
        }
    }
}

/// Category `<option>` display data.
#[derive(Clone)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

fn category_options(categories: &[Category], filter: &CatalogFilter) -> Vec<CategoryOption> {
    let selected = filter.categoria.trim();
    let all = CategoryOption {
        value: ALL_CATEGORIES.to_string(),
        label: "Todas".to_string(),
        selected: selected.is_empty() || selected == ALL_CATEGORIES,
    };

    std::iter::once(all)
        .chain(categories.iter().map(|category| {
            let value = category.id.to_string();
            CategoryOption {
                selected: value == selected,
                label: category.nombre.clone(),
                value,
            }
        }))
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Product grid page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<FlashNotice>,
    pub featured: Vec<ProductCardView>,
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryOption>,
    pub query: String,
    pub load_error: Option<String>,
}

/// Inline notice fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/notice.html")]
pub struct NoticeTemplate {
    pub notice: FlashNotice,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product grid.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(filter): Query<CatalogFilter>,
) -> impl IntoResponse {
    let (products, load_error) = match state.backend().list_products().await {
        Ok(products) => (
            filter
                .apply(&products)
                .into_iter()
                .map(ProductCardView::from)
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load products");
            (Vec::new(), Some(PRODUCTS_LOAD_FAILURE.to_string()))
        }
    };

    let featured = if filter.is_unfiltered() && load_error.is_none() {
        match state.backend().featured_products().await {
            Ok(featured) => featured.iter().map(ProductCardView::from).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load featured products");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let categories = state.backend().list_categories().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load categories");
        Vec::new()
    });

    ProductsIndexTemplate {
        user,
        flash: take_flash(&session).await,
        categories: category_options(&categories, &filter),
        query: filter.q,
        featured,
        products,
        load_error,
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub producto_id: ProductId,
    #[serde(default)]
    pub nombre: String,
    pub quantity: Option<u32>,
}

/// Add a product to the signed-in user's cart (HTMX).
///
/// Always answers with a notice fragment; on success it also triggers
/// `cart-updated` so other fragments can refresh.
#[instrument(skip(state, user), fields(product_id = %form.producto_id))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let Some(user) = user else {
        return NoticeTemplate {
            notice: FlashNotice::error(ADD_SIGN_IN_MESSAGE),
        }
        .into_response();
    };

    let quantity = form.quantity.unwrap_or(1).max(1);
    let result = state
        .backend()
        .add_cart_item(user.id, form.producto_id, quantity)
        .await;

    if let Err(e) = &result {
        tracing::warn!(error = %e, "Failed to add product to cart");
    } else {
        let product_id = form.producto_id.to_string();
        add_breadcrumb(
            "cart",
            "Added product",
            Some(&[("product_id", product_id.as_str())]),
        );
    }

    let notice = add_to_cart_notice(&result, &form.nombre);
    if notice.is_error {
        NoticeTemplate { notice }.into_response()
    } else {
        (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            NoticeTemplate { notice },
        )
            .into_response()
    }
}

/// Visitor-facing outcome of an add-to-cart request.
fn add_to_cart_notice(result: &Result<(), BackendError>, name: &str) -> FlashNotice {
    match result {
        Ok(()) => {
            let name = if name.trim().is_empty() {
                "Producto"
            } else {
                name.trim()
            };
            FlashNotice::success(format!("\"{name}\" agregado al carrito"))
        }
        Err(e) => FlashNotice::error(match e.status() {
            Some(401) => ADD_SESSION_EXPIRED_MESSAGE,
            Some(404) => ADD_NOT_FOUND_MESSAGE,
            _ => ADD_FAILURE_MESSAGE,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use hazel_lab_core::CategoryId;

    use super::*;

    fn api_error(status: u16) -> Result<(), BackendError> {
        Err(BackendError::Api {
            status,
            message: String::new(),
        })
    }

    #[test]
    fn test_add_to_cart_success_names_product() {
        let notice = add_to_cart_notice(&Ok(()), "Mesa de Roble");
        assert!(!notice.is_error);
        assert_eq!(notice.message, "\"Mesa de Roble\" agregado al carrito");
    }

    #[test]
    fn test_add_to_cart_failures_by_status() {
        assert_eq!(
            add_to_cart_notice(&api_error(401), "Mesa").message,
            ADD_SESSION_EXPIRED_MESSAGE
        );
        assert_eq!(
            add_to_cart_notice(&api_error(404), "Mesa").message,
            ADD_NOT_FOUND_MESSAGE
        );
        assert_eq!(
            add_to_cart_notice(&api_error(500), "Mesa").message,
            ADD_FAILURE_MESSAGE
        );
        assert_eq!(
            add_to_cart_notice(&Err(BackendError::Parse("x".to_string())), "Mesa").message,
            ADD_FAILURE_MESSAGE
        );
    }

    #[test]
    fn test_product_card_fallbacks() {
        let product: Product = serde_json::from_value(serde_json::json!({"id": 5})).unwrap();
        let card = ProductCardView::from(&product);

        assert_eq!(card.name, "Sin nombre");
        assert_eq!(card.image, "/static/img/wooden.jpg");
        assert_eq!(card.price, "$0");
        assert_eq!(card.category, None);
    }

    #[test]
    fn test_category_options_mark_selection() {
        let categories = vec![
            Category {
                id: CategoryId::new(1),
                nombre: "Muebles".to_string(),
            },
            Category {
                id: CategoryId::new(2),
                nombre: "Deco".to_string(),
            },
        ];

        let options = category_options(&categories, &CatalogFilter::default());
        assert_eq!(options.len(), 3);
        assert!(options[0].selected);

        let filter = CatalogFilter {
            categoria: "2".to_string(),
            q: String::new(),
        };
        let options = category_options(&categories, &filter);
        assert!(!options[0].selected);
        assert!(options[2].selected);
        assert_eq!(options[2].label, "Deco");
    }
}
