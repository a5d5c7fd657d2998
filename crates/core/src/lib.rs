//! Domain rules for the restaurant ordering backend.
//!
//! This crate has no database dependency: every invariant that keeps the
//! catalog, orders, reviews and stored images consistent is expressed here as
//! plain functions and value types, and the `db` / `api` crates call into it.

pub mod assets;
pub mod catalog;
pub mod error;
pub mod order;
pub mod review;
pub mod roles;
pub mod search;
pub mod settings;
pub mod types;
