//! Hazel Lab Core - Shared domain types.
//!
//! This crate provides the types used across all Hazel Lab components:
//! - `storefront` - Public-facing web storefront
//! - `cli` - Command-line tools for running checkouts and product searches
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Checkout pricing lives here so that it can be exercised without a
//! backend and reused by every front end.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, CLP money, cart lines, checkout methods and
//!   totals, RUN and email value types, user roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
