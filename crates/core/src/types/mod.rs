//! Core types for Hazel Lab.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod checkout;
pub mod email;
pub mod id;
pub mod money;
pub mod run;
pub mod status;

pub use cart::{CartLine, CartLineId, CoercionPolicy, ProductSummary, SanitizeError, sanitize_lines};
pub use checkout::{DeliveryMethod, OrderTotals, PaymentMethod, UnknownMethod, compute_totals};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Clp;
pub use run::{Run, RunError, format_rut, is_formatted_rut};
pub use status::*;
