//! Error types for the product synchronization layer.
//!
//! This module defines the centralized error type [`GestlyError`] and a type alias
//! [`Result`] used throughout the crate. Errors are derived with `thiserror`.
//!
//! Three variants are user-facing and get recovered into notices on the view or
//! form state rather than being propagated further:
//!
//! - [`GestlyError::RemoteUnavailable`]: a store feed or request failed
//! - [`GestlyError::Validation`]: form input could not be turned into a product
//! - [`GestlyError::NotFound`]: an id did not resolve to a known product
//!
//! The remaining variants cover local infrastructure (files, config, session).

use thiserror::Error;

/// The main error type for gestly operations.
///
/// # Examples
///
/// ```
/// use gestly::GestlyError;
///
/// fn parse_stock(raw: &str) -> Result<i32, GestlyError> {
///     raw.trim()
///         .parse()
///         .map_err(|_| GestlyError::Validation(format!("invalid stock: {raw}")))
/// }
///
/// assert!(parse_stock("12").is_ok());
/// assert!(parse_stock("twelve").is_err());
/// ```
#[derive(Debug, Error)]
pub enum GestlyError {
    /// The product store could not be reached or a live feed failed.
    ///
    /// The string carries the store's description of the failure.
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// User input could not be converted into a product.
    ///
    /// Raised for blank required fields, non-numeric prices or stock, and
    /// updates attempted without a product identifier.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A product id did not match any known product.
    #[error("Product not found: {0}")]
    NotFound(String),

    /// Local document storage failed (lock poisoning, malformed file).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document or session file could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration is invalid or could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The local authentication session is missing or unusable.
    #[error("Session error: {0}")]
    Session(String),
}

/// A specialized `Result` type for gestly operations.
pub type Result<T> = std::result::Result<T, GestlyError>;
