//! Product store layer.
//!
//! This module provides the abstraction over the authoritative product store and
//! the document backend shipped with the crate.
//!
//! # Modules
//!
//! - `backend`: [`ProductStore`] trait and the [`ProductFeed`] live-stream type
//! - `json`: in-memory / JSON-file document collection with live feeds
//! - `models`: stored document representation, separate from the domain model

pub mod backend;
pub mod json;
pub mod models;

pub use backend::{ProductFeed, ProductStore};
pub use json::JsonProductStore;
pub use models::ProductDocument;
