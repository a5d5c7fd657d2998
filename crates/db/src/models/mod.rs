//! Row structs and write DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the table, plus the input structs its repository accepts. Request parsing
//! and validation happen in the API layer; these DTOs are already validated.

pub mod category;
pub mod item;
pub mod offer;
pub mod order;
pub mod review;
pub mod settings;
pub mod slider;
pub mod user;
