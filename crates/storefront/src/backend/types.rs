//! Wire types for the Hazel Lab REST backend.
//!
//! Field names follow the backend's JSON (camelCase, mixed Spanish and
//! English). Almost everything is optional because the backend serialises
//! nulls freely.

use hazel_lab_core::{CategoryId, Clp, ProductId, UserId, UserRole, UserStatus};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

/// Image shown for products without one.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/wooden.jpg";

/// Name shown for products without one.
pub const UNNAMED_PRODUCT: &str = "Sin nombre";

/// Region names used when the backend cannot be reached.
pub const FALLBACK_REGIONS: [&str; 16] = [
    "Arica y Parinacota",
    "Tarapacá",
    "Antofagasta",
    "Atacama",
    "Coquimbo",
    "Valparaíso",
    "Metropolitana",
    "O'Higgins",
    "Maule",
    "Ñuble",
    "Biobío",
    "Araucanía",
    "Los Ríos",
    "Los Lagos",
    "Aysén",
    "Magallanes",
];

// =============================================================================
// Catalogue
// =============================================================================

/// A product as returned by `/productos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub active_status: Option<bool>,
    #[serde(default)]
    pub destacado: Option<bool>,
}

impl Product {
    /// Display name, `"Sin nombre"` when missing or blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(UNNAMED_PRODUCT)
    }

    /// Image URL, the placeholder when missing or blank.
    #[must_use]
    pub fn image_url(&self) -> &str {
        self.image
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Unit price; a missing cost reads as zero.
    #[must_use]
    pub fn price(&self) -> Clp {
        Clp::new(self.cost.unwrap_or(0))
    }

    /// Category id rendered as a string, the form the category filter uses.
    #[must_use]
    pub fn category_key(&self) -> Option<String> {
        self.category.as_ref().map(|c| c.id.to_string())
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub nombre: String,
}

/// Filters for `GET /productos/buscar/avanzada`.
///
/// Unset filters are left out of the query string entirely. `stock_bajo` is
/// only sent when `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
    #[serde(skip_serializing_if = "is_false")]
    pub stock_bajo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destacado: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precio_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precio_max: Option<i64>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

// =============================================================================
// Accounts
// =============================================================================

/// A user account as returned by `/auth/login` and `/usuarios`.
///
/// The backend blanks the password before answering; it is never read here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendUser {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub rut: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub comuna: Option<String>,
    #[serde(default)]
    pub apellidos: Option<String>,
    #[serde(default)]
    pub fecha_nacimiento: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
}

/// Body of `POST /usuarios`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub rut: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
    pub role: UserRole,
    pub status: UserStatus,
    pub region: String,
    pub comuna: String,
    pub direccion: String,
    pub apellidos: String,
    pub fecha_nacimiento: String,
}

fn expose_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

// =============================================================================
// Cart
// =============================================================================

/// Reference to an entity by id, as the cart endpoints expect (`{"id": 4}`).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IdRef<T> {
    pub id: T,
}

/// Body of `POST /itemscarrito`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCartItem {
    pub usuario: IdRef<UserId>,
    pub producto: IdRef<ProductId>,
    pub quantity: u32,
}

/// Body of `PUT /itemscarrito/{id}/cantidad`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuantityUpdate {
    pub quantity: u32,
}
