//! Store doubles and helpers shared by the integration tests.

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use futures_util::{stream, FutureExt, StreamExt};
use gestly::app::{ProductController, ProductSettings, ProductViewState};
use gestly::store::{JsonProductStore, ProductFeed, ProductStore};
use gestly::{GestlyError, Product, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// In-memory store that records search queries and can be told to fail.
#[derive(Clone)]
pub struct RecordingStore {
    inner: JsonProductStore,
    searches: Arc<Mutex<Vec<String>>>,
    fail_feeds: Arc<AtomicBool>,
    fail_mutations: Arc<AtomicBool>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: JsonProductStore::in_memory(),
            searches: Arc::default(),
            fail_feeds: Arc::default(),
            fail_mutations: Arc::default(),
        }
    }

    /// Adds `count` products named `"{prefix} 00"`, `"{prefix} 01"`, ...
    pub async fn seed(&self, prefix: &str, count: usize) -> Vec<String> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let product = Product {
                stock: 10,
                net_weight: 250.0,
                branch: "Centro".into(),
                ..Product::new(format!("{prefix} {i:02}"), 100.0, 150.0)
            };
            ids.push(self.inner.add_product(product).await.unwrap());
        }
        ids
    }

    /// The store's own current listing.
    pub async fn listing(&self) -> Vec<Product> {
        self.inner.products().next().await.unwrap().unwrap()
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn fail_feeds(&self, fail: bool) {
        self.fail_feeds.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len().unwrap()
    }

    fn offline_feed() -> ProductFeed {
        stream::once(async { Err(GestlyError::RemoteUnavailable("store offline".into())) }).boxed()
    }

    fn offline<T: Send + 'static>() -> BoxFuture<'static, Result<T>> {
        async { Err(GestlyError::RemoteUnavailable("store offline".into())) }.boxed()
    }
}

impl ProductStore for RecordingStore {
    fn add_product(&self, product: Product) -> BoxFuture<'_, Result<String>> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Self::offline();
        }
        self.inner.add_product(product)
    }

    fn update_product(&self, product: Product) -> BoxFuture<'_, Result<()>> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Self::offline();
        }
        self.inner.update_product(product)
    }

    fn delete_product(&self, id: String) -> BoxFuture<'_, Result<()>> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Self::offline();
        }
        self.inner.delete_product(id)
    }

    fn products(&self) -> ProductFeed {
        if self.fail_feeds.load(Ordering::SeqCst) {
            return Self::offline_feed();
        }
        self.inner.products()
    }

    fn search_products(&self, query: &str) -> ProductFeed {
        self.searches.lock().unwrap().push(query.to_string());
        if self.fail_feeds.load(Ordering::SeqCst) {
            return Self::offline_feed();
        }
        self.inner.search_products(query)
    }
}

pub fn controller(store: &RecordingStore) -> ProductController {
    ProductController::new(Arc::new(store.clone()), ProductSettings::default()).unwrap()
}

/// Waits (in virtual time) until the view satisfies `done`.
pub async fn wait_until(
    view: &mut watch::Receiver<ProductViewState>,
    done: impl FnMut(&ProductViewState) -> bool,
) -> ProductViewState {
    let state = tokio::time::timeout(Duration::from_secs(5), view.wait_for(done))
        .await
        .expect("view did not settle in time")
        .expect("controller dropped");
    (*state).clone()
}

/// Waits for a listing emission to be applied.
pub async fn wait_for_listing(view: &mut watch::Receiver<ProductViewState>) -> ProductViewState {
    wait_until(view, |v| v.current_page >= 1 && !v.is_loading).await
}

/// Waits for search results to be applied.
pub async fn wait_for_search(view: &mut watch::Receiver<ProductViewState>) -> ProductViewState {
    wait_until(view, |v| v.current_page == 0 && !v.is_loading && v.is_searching()).await
}
