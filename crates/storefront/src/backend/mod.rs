//! Hazel Lab REST backend client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The backend is source of truth - NO local persistence, direct API calls
//! - In-memory caching via `moka` for the product catalogue (5 minute TTL)
//!
//! # Endpoints
//!
//! ## Catalogue
//! - `GET /productos`, `/productos/destacados`, `/productos/buscar/avanzada`
//! - `GET /categorias`
//!
//! ## Accounts
//! - `POST /auth/login`, `POST /usuarios`
//! - `GET /ubicacion/regiones`, `/ubicacion/comunas/{region}`
//!
//! ## Cart
//! - `POST /itemscarrito`, `GET /itemscarrito/usuario/{id}`
//! - `PUT /itemscarrito/{id}/cantidad`, `DELETE /itemscarrito/{id}`
//!
//! # Example
//!
//! ```rust,ignore
//! use hazel_lab_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//!
//! let products = client.list_products().await?;
//! client.add_cart_item(user_id, products[0].id, 1).await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection refused, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// HTTP status returned by the backend, if it answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// Message the backend put in its error body, if any.
    ///
    /// Returns `None` for transport and parse failures, and for empty
    /// bodies, so callers can fall back to their own generic wording.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers errors either as a bare string or as an object with a
/// `message` or `error` field.
pub(crate) fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(message)) => message,
        Ok(serde_json::Value::Object(map)) => ["message", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(serde_json::Value::as_str))
            .map_or_else(|| body.to_string(), String::from),
        _ => body.trim().to_string(),
    }
}
