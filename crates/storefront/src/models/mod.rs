//! Session-stored models for storefront.

pub mod session;

pub use session::{CheckoutSnapshot, CurrentUser, FlashNotice, keys};
