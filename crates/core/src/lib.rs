//! Corner Shop Core - Shared domain types.
//!
//! This crate provides the types used across all Corner Shop components:
//! - `storefront` - Server-rendered storefront client
//! - `cli` - Command-line tools for sessions and accounts
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no session access. Persisting a [`Cart`] is the storefront's job;
//! this crate only knows how to mutate one and how to read and write its
//! serialized form.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails
//! - [`product`] - Products and product drafts
//! - [`cart`] - The cart mapping and its invariants

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod product;
pub mod types;

pub use cart::{Cart, CartEntry, CartError};
pub use product::{Product, ProductDraft, ProductError};
pub use types::*;
