//! CLI subcommands.

pub mod checkout;
pub mod products;
pub mod rut;

use hazel_lab_storefront::backend::{BackendClient, BackendError};
use hazel_lab_storefront::config::{BackendConfig, ConfigError};
use thiserror::Error;

/// Errors shared by the commands that talk to the backend.
#[derive(Debug, Error)]
pub enum BackendSetupError {
    /// Backend settings in the environment are invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("Backend client error: {0}")]
    Client(#[from] BackendError),
}

/// Build a backend client from `HAZEL_API_URL` / `HAZEL_API_TIMEOUT_SECS`.
pub fn backend_client() -> Result<BackendClient, BackendSetupError> {
    dotenvy::dotenv().ok();

    let config = BackendConfig::from_env()?;
    tracing::info!("Using backend at {}", config.api_url);
    Ok(BackendClient::new(&config)?)
}
