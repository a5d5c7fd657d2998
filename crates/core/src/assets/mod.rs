//! Image asset lifecycle.
//!
//! Catalog entities reference stored images by an opaque URL. Each URL is
//! owned by exactly one entity field; [`manager::AssetManager`] couples blob
//! uploads and deletions to the entity writes so that:
//!
//! - an entity never references a blob whose upload failed,
//! - a replaced or released blob is deleted (deletion failures are logged
//!   and tolerated as orphans).
//!
//! - [`store`] -- the [`store::BlobStore`] seam and its error type.
//! - [`local`] -- filesystem-backed store served over HTTP.
//! - [`memory`] -- in-process store that records every call.
//! - [`upload`] -- uploaded file validation and blob key naming.
//! - [`manager`] -- upload / replace / release orchestration.

pub mod local;
pub mod manager;
pub mod memory;
pub mod store;
pub mod upload;
