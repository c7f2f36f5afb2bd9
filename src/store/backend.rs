//! Product store abstraction.
//!
//! This module defines the [`ProductStore`] trait, the contract between the
//! synchronization layer and whatever authoritative document store holds the
//! catalog. The controller only ever talks to a `dyn ProductStore`, so the
//! backend can be swapped without touching pagination or search logic.
//!
//! # Design Philosophy
//!
//! Mutations are single request/response exchanges returning boxed futures.
//! Reads are live feeds: each call opens a new subscription that emits the full
//! current result immediately and again after every change. Dropping the stream
//! is the unsubscribe.

use crate::domain::error::Result;
use crate::domain::Product;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

/// A live-updating sequence of complete product lists.
///
/// An `Err` item means the subscription failed; consumers stop reading after
/// the first error and resubscribe on user request.
pub type ProductFeed = BoxStream<'static, Result<Vec<Product>>>;

/// Abstraction over the authoritative product store.
///
/// # Implementations
///
/// - [`JsonProductStore`](crate::store::JsonProductStore): in-memory or
///   JSON-file-backed document collection (default)
///
/// # Examples
///
/// ```no_run
/// use futures_util::StreamExt;
/// use gestly::store::{JsonProductStore, ProductStore};
/// use gestly::Product;
///
/// # async fn demo() -> gestly::Result<()> {
/// let store = JsonProductStore::in_memory();
/// let id = store.add_product(Product::new("Rice", 1.0, 1.5)).await?;
///
/// let mut feed = store.products();
/// let first = feed.next().await.transpose()?.unwrap_or_default();
/// assert_eq!(first[0].id, id);
/// # Ok(())
/// # }
/// ```
pub trait ProductStore: Send + Sync {
    /// Persists a new product and returns the identifier the store assigned.
    ///
    /// Any `id` already present on `product` is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects or cannot complete the write.
    fn add_product(&self, product: Product) -> BoxFuture<'_, Result<String>>;

    /// Overwrites the stored fields of an existing product.
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::Validation`](crate::GestlyError::Validation) if
    /// `product.id` is empty and
    /// [`GestlyError::NotFound`](crate::GestlyError::NotFound) if no product has
    /// that id.
    fn update_product(&self, product: Product) -> BoxFuture<'_, Result<()>>;

    /// Removes a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown or the write fails.
    fn delete_product(&self, id: String) -> BoxFuture<'_, Result<()>>;

    /// Opens a live feed of every product, most recently uploaded first.
    fn products(&self) -> ProductFeed;

    /// Opens a live feed of products whose name starts with `query`, ordered by name.
    fn search_products(&self, query: &str) -> ProductFeed;
}
