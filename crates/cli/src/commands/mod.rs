//! CLI subcommands.

pub mod cart;
pub mod migrate;
pub mod user;
