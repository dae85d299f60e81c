//! Corner Shop Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart_store;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod filters;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod presentation;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
