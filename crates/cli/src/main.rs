//! Hazel Lab CLI - Checkout runs, product search and RUT helpers.
//!
//! # Usage
//!
//! ```bash
//! # Run the checkout flow for a user against the backend
//! hazel-cli checkout --user-id 7 --delivery estandar --payment tarjeta
//!
//! # Advanced product search
//! hazel-cli products search --nombre silla --precio-max 50000
//!
//! # RUT helpers
//! hazel-cli rut format 19011022k
//! hazel-cli rut validate 19011022K
//! ```
//!
//! # Commands
//!
//! - `checkout` - Fetch a cart, price it and try to confirm it
//! - `products search` - Search the catalogue with backend filters
//! - `rut format` / `rut validate` - Chilean RUT helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hazel-cli")]
#[command(author, version, about = "Hazel Lab CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the checkout flow for a user
    Checkout {
        /// Backend user id whose cart is checked out
        #[arg(short, long)]
        user_id: i64,

        /// Delivery method (`retiro`, `estandar`, `express`)
        #[arg(short, long, default_value = "retiro")]
        delivery: String,

        /// Payment method (`tarjeta`, `transferencia`, `efectivo`)
        #[arg(short, long, default_value = "")]
        payment: String,

        /// Reject malformed cart lines instead of coercing them
        #[arg(long)]
        strict: bool,
    },
    /// Browse the product catalogue
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Chilean RUT helpers
    Rut {
        #[command(subcommand)]
        action: RutAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Advanced search (only the given filters are sent)
    Search(commands::products::SearchArgs),
}

#[derive(Subcommand)]
enum RutAction {
    /// Print a RUT in dotted form (12.345.678-K)
    Format {
        /// RUT in any notation
        rut: String,
    },
    /// Check that a RUN or RUT is well formed
    Validate {
        /// Compact RUN (19011022K) or dotted RUT (19.011.022-K)
        rut: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Checkout {
            user_id,
            delivery,
            payment,
            strict,
        } => {
            commands::checkout::run(user_id, &delivery, &payment, strict).await?;
        }
        Commands::Products { action } => match action {
            ProductsAction::Search(args) => commands::products::search(args).await?,
        },
        Commands::Rut { action } => match action {
            RutAction::Format { rut } => commands::rut::format(&rut),
            RutAction::Validate { rut } => commands::rut::validate(&rut)?,
        },
    }
    Ok(())
}
