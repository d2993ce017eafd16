//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Product grid filtering (category and free-text search)
//! - `checkout` - Checkout flow controller (cart retrieval, totals, confirmation gate)
//! - `registration` - Customer self-registration rules and payload building

pub mod catalog;
pub mod checkout;
pub mod registration;
