//! Product search command.

use clap::Args;
use hazel_lab_core::CategoryId;
use hazel_lab_storefront::backend::{BackendError, ProductSearch};
use thiserror::Error;

use super::{BackendSetupError, backend_client};

/// Filters for `products search`. Unset filters are not sent.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Name contains
    #[arg(long)]
    pub nombre: Option<String>,

    /// Category id
    #[arg(long)]
    pub categoria_id: Option<i64>,

    /// Only active (true) or inactive (false) products
    #[arg(long)]
    pub activo: Option<bool>,

    /// Only products with low stock
    #[arg(long)]
    pub stock_bajo: bool,

    /// Only featured (true) or non-featured (false) products
    #[arg(long)]
    pub destacado: Option<bool>,

    /// Minimum price in CLP
    #[arg(long)]
    pub precio_min: Option<i64>,

    /// Maximum price in CLP
    #[arg(long)]
    pub precio_max: Option<i64>,
}

impl From<SearchArgs> for ProductSearch {
    fn from(args: SearchArgs) -> Self {
        Self {
            nombre: args.nombre,
            categoria_id: args.categoria_id.map(CategoryId::new),
            activo: args.activo,
            stock_bajo: args.stock_bajo,
            destacado: args.destacado,
            precio_min: args.precio_min,
            precio_max: args.precio_max,
        }
    }
}

/// Errors that can occur during a product search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Setup(#[from] BackendSetupError),

    #[error("Search failed: {0}")]
    Backend(#[from] BackendError),
}

/// Run an advanced search and log each hit.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or rejects the query.
pub async fn search(args: SearchArgs) -> Result<(), SearchError> {
    let client = backend_client()?;
    let filters = ProductSearch::from(args);

    let products = client.search_products(&filters).await?;
    tracing::info!("{} product(s) found", products.len());

    for product in &products {
        tracing::info!(
            "  #{} {} - {}{}",
            product.id,
            product.display_name(),
            product.price(),
            product
                .category
                .as_ref()
                .map(|c| format!(" [{}]", c.nombre))
                .unwrap_or_default()
        );
    }

    Ok(())
}
