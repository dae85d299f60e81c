//! Session-scoped models for the storefront.
//!
//! Products and carts live in `corner_shop_core`; this module holds what the
//! storefront keeps in a visitor's session.

pub mod session;

pub use session::{CurrentUser, UserProfile, keys as session_keys};
