//! JSON document-store backend.
//!
//! [`JsonProductStore`] keeps the product collection in memory, keyed by
//! store-assigned ids, and optionally mirrors it to a JSON file using atomic
//! writes (write-to-temp + rename). Every write bumps a revision counter held in
//! a `tokio::sync::watch` channel; each open feed waits on that channel and
//! re-emits its full result when it moves.
//!
//! # File Format
//!
//! ```json
//! {
//!   "products": {
//!     "018c2f1e9a4b000001": {
//!       "name": "Coffee beans",
//!       "purchasePrice": 100.0,
//!       "sellingPrice": 150.0,
//!       "stock": 10,
//!       "netWeight": 500.0,
//!       "weightUnit": "MG",
//!       "branch": "Centro",
//!       "purchaseDate": null,
//!       "uploadDate": 1700000000000,
//!       "editDate": 1700000000000
//!     }
//!   }
//! }
//! ```

use crate::domain::error::{GestlyError, Result};
use crate::domain::Product;
use crate::store::backend::{ProductFeed, ProductStore};
use crate::store::models::ProductDocument;
use futures_util::future::BoxFuture;
use futures_util::{stream, FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// On-disk container for the collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    products: HashMap<String, ProductDocument>,
}

impl StoreData {
    /// Every product, most recently uploaded first.
    ///
    /// Ties on `uploadDate` fall back to descending id, which follows insertion
    /// order because ids embed a sequence number.
    fn by_recency(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .map(|(id, doc)| doc.to_product(id))
            .collect();
        products.sort_by(|a, b| {
            b.upload_date
                .cmp(&a.upload_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        products
    }

    /// Products whose name starts with `prefix`, ordered by name.
    fn by_name_prefix(&self, prefix: &str) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|(_, doc)| doc.name.starts_with(prefix))
            .map(|(id, doc)| doc.to_product(id))
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        products
    }
}

struct Shared {
    data: Mutex<StoreData>,
    /// Bumped after every committed write.
    revision: watch::Sender<u64>,
    next_seq: AtomicU64,
    /// Backing file, `None` for a purely in-memory store.
    file_path: Option<PathBuf>,
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, StoreData>> {
        self.data
            .lock()
            .map_err(|e| GestlyError::Storage(format!("product collection lock poisoned: {e}")))
    }

    /// Generates a document key: creation millis followed by a per-store sequence.
    fn next_id(&self, now: i64) -> String {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        format!("{now:012x}{seq:06x}")
    }

    /// Persists the collection (if file-backed) and wakes every live feed.
    fn commit(&self, data: &StoreData) -> Result<()> {
        if let Some(path) = &self.file_path {
            save_to_file(path, data)?;
        }
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
        Ok(())
    }
}

/// Document-store backend with live feeds.
///
/// Cloning is cheap and every clone shares the same collection and feeds.
///
/// # Examples
///
/// ```no_run
/// use gestly::store::JsonProductStore;
/// use std::path::PathBuf;
///
/// let store = JsonProductStore::open(PathBuf::from("/tmp/gestly/products.json"))?;
/// # Ok::<(), gestly::GestlyError>(())
/// ```
#[derive(Clone)]
pub struct JsonProductStore {
    shared: Arc<Shared>,
}

impl JsonProductStore {
    /// Creates an empty store that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_data(StoreData::default(), None)
    }

    /// Creates or opens a file-backed store.
    ///
    /// If the file exists its documents are loaded. Parent directories are
    /// created automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the file
    /// exists but is not a valid collection.
    pub fn open(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "opening product store");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            load_from_file(&file_path)?
        } else {
            tracing::debug!("initializing new empty product store");
            StoreData::default()
        };

        tracing::debug!(product_count = data.products.len(), "product store opened");
        Ok(Self::with_data(data, Some(file_path)))
    }

    fn with_data(data: StoreData, file_path: Option<PathBuf>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                data: Mutex::new(data),
                revision,
                next_seq: AtomicU64::new(0),
                file_path,
            }),
        }
    }

    /// Number of stored products.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.shared.lock()?.products.len())
    }

    /// Returns `true` if the store holds no products.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn insert(&self, product: &Product) -> Result<String> {
        let _span = tracing::debug_span!("store_add_product", name = %product.name).entered();

        let now = chrono::Utc::now().timestamp_millis();
        let id = self.shared.next_id(now);

        let mut doc = ProductDocument::from_product(product);
        doc.upload_date = now;
        doc.edit_date = now;

        let mut data = self.shared.lock()?;
        data.products.insert(id.clone(), doc);
        self.shared.commit(&data)?;

        tracing::debug!(product_id = %id, "product added");
        Ok(id)
    }

    fn replace(&self, product: &Product) -> Result<()> {
        let _span = tracing::debug_span!("store_update_product", product_id = %product.id).entered();

        if product.id.is_empty() {
            return Err(GestlyError::Validation(
                "cannot update a product without an id".to_string(),
            ));
        }

        let mut data = self.shared.lock()?;
        let existing = data
            .products
            .get_mut(&product.id)
            .ok_or_else(|| GestlyError::NotFound(product.id.clone()))?;

        let upload_date = existing.upload_date;
        *existing = ProductDocument::from_product(product);
        existing.upload_date = upload_date;
        existing.edit_date = chrono::Utc::now().timestamp_millis();

        self.shared.commit(&data)?;
        tracing::debug!("product updated");
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        let _span = tracing::debug_span!("store_delete_product", product_id = %id).entered();

        let mut data = self.shared.lock()?;
        if data.products.remove(id).is_none() {
            return Err(GestlyError::NotFound(id.to_string()));
        }

        self.shared.commit(&data)?;
        tracing::debug!("product deleted");
        Ok(())
    }

    /// Opens a live feed that re-runs `select` after every committed write.
    ///
    /// The first item is emitted immediately with the current contents.
    fn feed<F>(&self, select: F) -> ProductFeed
    where
        F: Fn(&StoreData) -> Vec<Product> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let revision = shared.revision.subscribe();

        stream::unfold(
            (shared, revision, select, true),
            |(shared, mut revision, select, first)| async move {
                if !first && revision.changed().await.is_err() {
                    return None;
                }
                let products = shared.lock().map(|data| select(&*data));
                Some((products, (shared, revision, select, false)))
            },
        )
        .boxed()
    }
}

impl ProductStore for JsonProductStore {
    fn add_product(&self, product: Product) -> BoxFuture<'_, Result<String>> {
        let result = self.insert(&product);
        async move { result }.boxed()
    }

    fn update_product(&self, product: Product) -> BoxFuture<'_, Result<()>> {
        let result = self.replace(&product);
        async move { result }.boxed()
    }

    fn delete_product(&self, id: String) -> BoxFuture<'_, Result<()>> {
        let result = self.remove(&id);
        async move { result }.boxed()
    }

    fn products(&self) -> ProductFeed {
        tracing::debug!("opening product listing feed");
        self.feed(StoreData::by_recency)
    }

    fn search_products(&self, query: &str) -> ProductFeed {
        tracing::debug!(query = %query, "opening product search feed");
        let prefix = query.to_string();
        self.feed(move |data| data.by_name_prefix(&prefix))
    }
}

impl std::fmt::Debug for JsonProductStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProductStore")
            .field("file_path", &self.shared.file_path)
            .finish_non_exhaustive()
    }
}

/// Loads the collection from a JSON file.
fn load_from_file(path: &Path) -> Result<StoreData> {
    let contents = std::fs::read_to_string(path)?;
    let data: StoreData = serde_json::from_str(&contents)
        .map_err(|e| GestlyError::Storage(format!("failed to parse product file: {e}")))?;

    tracing::debug!(products = data.products.len(), "loaded product documents");
    Ok(data)
}

/// Writes the collection to a temporary file, then renames it over the target.
fn save_to_file(path: &Path, data: &StoreData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    let tmp_path = path.with_extension("tmp");

    tracing::trace!(tmp_path = ?tmp_path, "writing product documents");
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn product(name: &str) -> Product {
        Product {
            stock: 3,
            ..Product::new(name, 10.0, 12.0)
        }
    }

    async fn next_list(feed: &mut ProductFeed) -> Vec<Product> {
        feed.next().await.expect("feed ended").expect("feed failed")
    }

    #[tokio::test]
    async fn add_assigns_distinct_ids() {
        let store = JsonProductStore::in_memory();
        let a = store.add_product(product("Apple")).await.unwrap();
        let b = store.add_product(product("Banana")).await.unwrap();

        assert!(!a.is_empty());
        assert_ne!(a, b);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_reemits_on_write() {
        let store = JsonProductStore::in_memory();
        store.add_product(product("Apple")).await.unwrap();

        let mut feed = store.products();
        let first = next_list(&mut feed).await;
        assert_eq!(first.len(), 1);

        store.add_product(product("Banana")).await.unwrap();
        let second = next_list(&mut feed).await;
        let names: Vec<_> = second.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Banana", "Apple"]);
    }

    #[tokio::test]
    async fn search_matches_name_prefix_case_sensitively() {
        let store = JsonProductStore::in_memory();
        for name in ["Milk", "Millet", "Almond milk", "milkshake"] {
            store.add_product(product(name)).await.unwrap();
        }

        let mut feed = store.search_products("Mil");
        let names: Vec<_> = next_list(&mut feed).await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Milk", "Millet"]);
    }

    #[tokio::test]
    async fn update_keeps_upload_date_and_requires_id() {
        let store = JsonProductStore::in_memory();
        let id = store.add_product(product("Tea")).await.unwrap();

        let mut feed = store.products();
        let stored = next_list(&mut feed).await.remove(0);

        let edited = Product {
            name: "Green tea".into(),
            upload_date: 0,
            ..stored.clone()
        };
        store.update_product(edited).await.unwrap();

        let updated = next_list(&mut feed).await.remove(0);
        assert_eq!(updated.id, id);
        assert_eq!(updated.name, "Green tea");
        assert_eq!(updated.upload_date, stored.upload_date);

        let err = store.update_product(product("No id")).await.unwrap_err();
        assert!(matches!(err, GestlyError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let store = JsonProductStore::in_memory();
        let err = store.delete_product("missing".into()).await.unwrap_err();
        assert!(matches!(err, GestlyError::NotFound(_)));
    }

    #[tokio::test]
    async fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("products.json");

        let id = {
            let store = JsonProductStore::open(path.clone()).unwrap();
            store.add_product(product("Honey")).await.unwrap()
        };

        let reopened = JsonProductStore::open(path).unwrap();
        let mut feed = reopened.products();
        let products = next_list(&mut feed).await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, id);
        assert_eq!(products[0].name, "Honey");
    }
}
