//! REST client for the Hazel Lab backend.
//!
//! Uses `reqwest` 0.13 with JSON bodies. Caches the product catalogue and
//! categories using `moka` (5-minute TTL).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hazel_lab_core::{CartLineId, ProductId, UserId};
use moka::future::Cache;
use reqwest::RequestBuilder;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::types::{
    BackendUser, Category, FALLBACK_REGIONS, IdRef, LoginRequest, NewCartItem, NewUser, Product,
    ProductSearch, QuantityUpdate,
};
use super::{BackendError, extract_error_message};
use crate::config::BackendConfig;
use crate::services::checkout::CartProvider;

/// Characters of a response body kept in logs.
const LOG_BODY_EXCERPT: usize = 500;

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the Hazel Lab REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client: builder.build()?,
                base_url: config.api_url.trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Base URL every endpoint path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request and return the raw body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %excerpt(&body),
                "Backend returned non-success status"
            );
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let body = self.send(request).await?;
        parse_body(&body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        self.fetch(self.inner.client.get(self.url(path))).await
    }

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers with a
    /// non-success status.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<(), BackendError> {
        self.send(self.inner.client.get(self.url("/categorias")))
            .await
            .map(drop)
    }

    // =========================================================================
    // Catalogue Methods
    // =========================================================================

    /// Get every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        self.cached_products(CacheKey::Products, "/productos").await
    }

    /// Get the products flagged as featured.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>, BackendError> {
        self.cached_products(CacheKey::FeaturedProducts, "/productos/destacados")
            .await
    }

    async fn cached_products(
        &self,
        key: CacheKey,
        path: &str,
    ) -> Result<Vec<Product>, BackendError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self.get(path).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Run an advanced product search. Results are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        filters: &ProductSearch,
    ) -> Result<Vec<Product>, BackendError> {
        self.fetch(self.search_request(filters)).await
    }

    fn search_request(&self, filters: &ProductSearch) -> RequestBuilder {
        self.inner
            .client
            .get(self.url("/productos/buscar/avanzada"))
            .query(filters)
    }

    /// Get every category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self.get("/categorias").await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with the backend's message when the
    /// credentials are rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: SecretString,
    ) -> Result<BackendUser, BackendError> {
        let body = LoginRequest {
            email: email.to_string(),
            password,
        };
        self.fetch(self.inner.client.post(self.url("/auth/login")).json(&body))
            .await
    }

    /// Create a user account.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with the backend's message when the
    /// account is rejected (duplicate email or RUT, invalid fields).
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create_user(&self, user: &NewUser) -> Result<BackendUser, BackendError> {
        self.fetch(self.inner.client.post(self.url("/usuarios")).json(user))
            .await
    }

    /// Get the region names for the registration form.
    ///
    /// Never fails: any error falls back to the built-in list.
    #[instrument(skip(self))]
    pub async fn regions(&self) -> Vec<String> {
        match self.get::<Vec<String>>("/ubicacion/regiones").await {
            Ok(regions) => regions,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load regions, using built-in list");
                FALLBACK_REGIONS.iter().map(ToString::to_string).collect()
            }
        }
    }

    /// Get the comunas of a region.
    ///
    /// Never fails: any error yields an empty list.
    #[instrument(skip(self))]
    pub async fn comunas(&self, region: &str) -> Vec<String> {
        let path = format!("/ubicacion/comunas/{}", urlencoding::encode(region));
        match self.get::<Vec<String>>(&path).await {
            Ok(comunas) => comunas,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load comunas");
                Vec::new()
            }
        }
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Add a product to a user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn add_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let body = NewCartItem {
            usuario: IdRef { id: user_id },
            producto: IdRef { id: product_id },
            quantity,
        };
        self.send(self.inner.client.post(self.url("/itemscarrito")).json(&body))
            .await
            .map(drop)
    }

    /// Get the raw cart payload of a user.
    ///
    /// The body is returned untyped; callers run it through
    /// [`hazel_lab_core::sanitize_lines`]. A successful response whose body
    /// is empty or not JSON reads as `null`, which sanitizes to an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not a success.
    #[instrument(skip(self))]
    pub async fn cart_items(&self, user_id: UserId) -> Result<Value, BackendError> {
        let path = format!("/itemscarrito/usuario/{user_id}");
        let body = self.send(self.inner.client.get(self.url(&path))).await?;
        Ok(cart_payload(&body))
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_cart_item(
        &self,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let path = format!(
            "/itemscarrito/{}/cantidad",
            urlencoding::encode(line_id.as_str())
        );
        self.send(
            self.inner
                .client
                .put(self.url(&path))
                .json(&QuantityUpdate { quantity }),
        )
        .await
        .map(drop)
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_cart_item(&self, line_id: &CartLineId) -> Result<(), BackendError> {
        let path = format!("/itemscarrito/{}", urlencoding::encode(line_id.as_str()));
        self.send(self.inner.client.delete(self.url(&path)))
            .await
            .map(drop)
    }
}

impl CartProvider for BackendClient {
    type Error = BackendError;

    fn fetch_cart_lines(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Value, Self::Error>> + Send {
        self.cart_items(user_id)
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %excerpt(body),
            "Failed to parse backend response"
        );
        BackendError::Parse(e.to_string())
    })
}

fn cart_payload(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|e| {
        tracing::warn!(
            error = %e,
            body = %excerpt(body),
            "Cart payload is not JSON, treating it as empty"
        );
        Value::Null
    })
}

fn excerpt(body: &str) -> String {
    body.chars().take(LOG_BODY_EXCERPT).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hazel_lab_core::CategoryId;

    use super::*;

    fn client() -> BackendClient {
        BackendClient::new(&BackendConfig {
            api_url: "http://backend.test/api/".to_string(),
            timeout: None,
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_has_no_trailing_slash() {
        let client = client();
        assert_eq!(client.base_url(), "http://backend.test/api");
        assert_eq!(client.url("/productos"), "http://backend.test/api/productos");
    }

    #[test]
    fn test_search_request_only_sends_set_filters() {
        let client = client();
        let filters = ProductSearch {
            nombre: Some("silla roja".to_string()),
            categoria_id: Some(CategoryId::new(3)),
            stock_bajo: true,
            precio_min: Some(1000),
            ..ProductSearch::default()
        };

        let request = client.search_request(&filters).build().unwrap();
        assert_eq!(request.url().path(), "/api/productos/buscar/avanzada");
        assert_eq!(
            request.url().query(),
            Some("nombre=silla+roja&categoriaId=3&stockBajo=true&precioMin=1000")
        );
    }

    #[test]
    fn test_search_request_without_filters_has_no_query() {
        let request = client()
            .search_request(&ProductSearch::default())
            .build()
            .unwrap();
        assert_eq!(request.url().query(), None);
    }

    #[test]
    fn test_parse_body_reports_parse_errors() {
        let err = parse_body::<Vec<Product>>("<html>oops</html>").unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[test]
    fn test_cart_payload_reads_junk_as_null() {
        assert_eq!(cart_payload(""), Value::Null);
        assert_eq!(cart_payload("  \n"), Value::Null);
        assert_eq!(cart_payload("<html>ok</html>"), Value::Null);
        assert_eq!(cart_payload("[]"), serde_json::json!([]));
        assert_eq!(cart_payload(r#"[{"id": 1}]"#), serde_json::json!([{"id": 1}]));
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let body = "ñ".repeat(LOG_BODY_EXCERPT + 10);
        assert_eq!(excerpt(&body).chars().count(), LOG_BODY_EXCERPT);
    }
}
