//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Account sign-in, sign-up, recovery and token refresh against
//!   the remote gateway

pub mod auth;
