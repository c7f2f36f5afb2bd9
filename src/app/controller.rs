//! Product screen controller: cache, pagination, search and mutations.
//!
//! [`ProductController`] owns one screen session. It keeps the
//! [`SnapshotCache`] in sync with the store's live listing, serves pages from
//! it, debounces searches, submits the product form, and publishes every change
//! of [`ProductViewState`] and [`ProductFormState`] through `watch` channels.
//!
//! # Architecture
//!
//! ```text
//! store.products() ──▶ listing task ──▶ SnapshotCache ──▶ first page ──▶ view watch
//!                                             │
//!                  load_more_products() ──────┘ (in-memory slice, no store call)
//!
//! search_products(q) ──▶ Debouncer (300 ms) ──▶ search task ──▶ view watch
//! ```
//!
//! All state lives behind one mutex and is only touched in short critical
//! sections, never across an `.await`. Tasks run on the Tokio runtime captured
//! at construction.
//!
//! # Ordering
//!
//! Every listing or search subscription takes a new epoch and aborts the
//! previous subscription task. Emissions are applied only while their epoch is
//! current, so a superseded feed can never overwrite newer state.
//!
//! # Example
//!
//! ```no_run
//! use gestly::app::{ProductController, ProductSettings};
//! use gestly::store::JsonProductStore;
//! use std::sync::Arc;
//!
//! # async fn demo() -> gestly::Result<()> {
//! let store = Arc::new(JsonProductStore::in_memory());
//! let controller = ProductController::new(store, ProductSettings::default())?;
//!
//! let mut view = controller.subscribe();
//! controller.load_products();
//! let state = view.wait_for(|v| !v.is_loading).await.map(|v| v.clone());
//! # let _ = state;
//! # Ok(())
//! # }
//! ```

use super::debounce::{Debouncer, DEFAULT_SEARCH_DEBOUNCE};
use super::form::{MutationStatus, ProductFormState};
use super::pager::{SnapshotCache, DEFAULT_PAGE_SIZE};
use super::state::{Notice, ProductViewState};
use crate::domain::error::{GestlyError, Result};
use crate::domain::Product;
use crate::store::ProductStore;
use futures_util::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// How long an error notice stays visible.
pub const DEFAULT_ERROR_TTL: Duration = Duration::from_secs(3);

/// How long a success notice stays visible.
pub const DEFAULT_SUCCESS_TTL: Duration = Duration::from_secs(2);

/// Tunables for one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSettings {
    pub page_size: usize,
    pub search_debounce: Duration,
    pub error_ttl: Duration,
    pub success_ttl: Duration,
}

impl Default for ProductSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            error_ttl: DEFAULT_ERROR_TTL,
            success_ttl: DEFAULT_SUCCESS_TTL,
        }
    }
}

/// Which state a notice is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    View,
    Form,
}

/// Auto-clear timer for one notice slot.
///
/// `seq` changes whenever the slot is overwritten or cleared, so a timer that
/// fires late never clears a newer notice.
#[derive(Debug, Default)]
struct NoticeTimer {
    seq: u64,
    task: Option<JoinHandle<()>>,
}

impl NoticeTimer {
    fn cancel(&mut self) -> u64 {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.seq = self.seq.wrapping_add(1);
        self.seq
    }
}

struct Inner {
    cache: SnapshotCache,
    view: ProductViewState,
    form: ProductFormState,
    /// Active listing subscription.
    subscription: Option<JoinHandle<()>>,
    /// Pending or running search, debounce included.
    search: Debouncer,
    epoch: u64,
    view_notice: NoticeTimer,
    form_notice: NoticeTimer,
    closed: bool,
}

impl Inner {
    fn new(settings: &ProductSettings) -> Self {
        Self {
            cache: SnapshotCache::new(settings.page_size),
            view: ProductViewState::default(),
            form: ProductFormState::default(),
            subscription: None,
            search: Debouncer::new(settings.search_debounce),
            epoch: 0,
            view_notice: NoticeTimer::default(),
            form_notice: NoticeTimer::default(),
            closed: false,
        }
    }

    /// Aborts the listing subscription and starts a new epoch.
    fn next_epoch(&mut self) -> u64 {
        if let Some(task) = self.subscription.take() {
            task.abort();
        }
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }

    fn timer(&mut self, target: Target) -> &mut NoticeTimer {
        match target {
            Target::View => &mut self.view_notice,
            Target::Form => &mut self.form_notice,
        }
    }

    fn notice(&mut self, target: Target) -> &mut Option<Notice> {
        match target {
            Target::View => &mut self.view.notice,
            Target::Form => &mut self.form.notice,
        }
    }

    /// Clears the notice in `target` if it matches `kind`, settling the form status.
    fn clear_notice(&mut self, target: Target, errors: bool) {
        let matches = self
            .notice(target)
            .as_ref()
            .is_some_and(|notice| notice.is_error() == errors);
        if !matches {
            return;
        }

        *self.notice(target) = None;
        self.timer(target).cancel();
        if target == Target::Form
            && matches!(self.form.status, MutationStatus::Succeeded | MutationStatus::Failed)
        {
            self.form.status = MutationStatus::Idle;
        }
    }
}

struct Shared {
    store: Arc<dyn ProductStore>,
    settings: ProductSettings,
    runtime: Handle,
    inner: Mutex<Inner>,
    view_tx: watch::Sender<ProductViewState>,
    form_tx: watch::Sender<ProductFormState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.view_tx.send_replace(inner.view.clone());
    }

    fn publish_form(&self, inner: &Inner) {
        self.form_tx.send_replace(inner.form.clone());
    }

    fn publish_target(&self, inner: &Inner, target: Target) {
        match target {
            Target::View => self.publish(inner),
            Target::Form => self.publish_form(inner),
        }
    }

    /// Shows a notice on `target` and schedules its removal.
    ///
    /// The caller publishes the state.
    fn post_notice(self: &Arc<Self>, inner: &mut Inner, target: Target, notice: Notice) {
        let ttl = if notice.is_error() {
            self.settings.error_ttl
        } else {
            self.settings.success_ttl
        };
        let errors = notice.is_error();

        *inner.notice(target) = Some(notice);
        let timer = inner.timer(target);
        let seq = timer.cancel();

        let shared = Arc::clone(self);
        timer.task = Some(self.runtime.spawn(async move {
            tokio::time::sleep(ttl).await;

            let mut inner = shared.lock();
            if inner.closed || inner.timer(target).seq != seq {
                return;
            }
            inner.clear_notice(target, errors);
            shared.publish_target(&inner, target);
        }));
    }

    /// Subscribes to the full listing, replacing any listing or search subscription.
    fn start_listing(self: &Arc<Self>, inner: &mut Inner) {
        inner.search.cancel();
        let epoch = inner.next_epoch();
        inner.view.is_loading = true;

        let span = tracing::debug_span!("product_listing", epoch);
        let task = Arc::clone(self).run_listing(epoch).instrument(span);
        inner.subscription = Some(self.runtime.spawn(task));
        self.publish(inner);
    }

    async fn run_listing(self: Arc<Self>, epoch: u64) {
        let mut feed = self.store.products();

        while let Some(emission) = feed.next().await {
            let mut inner = self.lock();
            if inner.closed || inner.epoch != epoch {
                tracing::debug!("dropping emission from superseded listing");
                return;
            }

            match emission {
                Ok(products) => {
                    let first_page = inner.cache.replace(products);
                    inner.view.products = first_page;
                    inner.view.has_more = inner.cache.has_more();
                    inner.view.current_page = inner.cache.page_index();
                    inner.view.is_loading = false;
                    inner.view.is_loading_more = false;
                    self.publish(&inner);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "product listing failed");
                    inner.view.is_loading = false;
                    self.post_notice(&mut inner, Target::View, Notice::Error(format!("Failed to load products: {e}")));
                    self.publish(&inner);
                    return;
                }
            }
        }

        tracing::debug!("product listing feed ended");
    }

    async fn run_search(self: Arc<Self>, query: String) {
        let epoch = {
            let mut inner = self.lock();
            if inner.closed {
                return;
            }
            let epoch = inner.next_epoch();
            inner.view.is_loading = true;
            self.publish(&inner);
            epoch
        };

        tracing::debug!(query = %query, "sending search query");
        let mut feed = self.store.search_products(&query);

        while let Some(emission) = feed.next().await {
            let mut inner = self.lock();
            if inner.closed || inner.epoch != epoch {
                tracing::debug!("dropping emission from superseded search");
                return;
            }

            match emission {
                Ok(results) => {
                    tracing::debug!(results = results.len(), "search results received");
                    inner.view.products = results;
                    inner.view.has_more = false;
                    inner.view.current_page = 0;
                    inner.view.is_loading = false;
                    inner.view.is_loading_more = false;
                    self.publish(&inner);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "product search failed");
                    inner.view.is_loading = false;
                    self.post_notice(&mut inner, Target::View, Notice::Error(format!("Search failed: {e}")));
                    self.publish(&inner);
                    return;
                }
            }
        }
    }
}

/// Owner of one product screen session.
///
/// Dropping the controller (or calling [`close`](Self::close)) cancels the
/// pending search, the active subscription and all notice timers.
pub struct ProductController {
    shared: Arc<Shared>,
}

impl ProductController {
    /// Creates a controller bound to the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::Config`] when called outside a Tokio runtime.
    pub fn new(store: Arc<dyn ProductStore>, settings: ProductSettings) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| GestlyError::Config(format!("no Tokio runtime available: {e}")))?;
        Ok(Self::with_runtime(store, settings, runtime))
    }

    /// Creates a controller whose tasks run on `runtime`.
    #[must_use]
    pub fn with_runtime(store: Arc<dyn ProductStore>, settings: ProductSettings, runtime: Handle) -> Self {
        let inner = Inner::new(&settings);
        let (view_tx, _) = watch::channel(inner.view.clone());
        let (form_tx, _) = watch::channel(inner.form.clone());

        Self {
            shared: Arc::new(Shared {
                store,
                settings,
                runtime,
                inner: Mutex::new(inner),
                view_tx,
                form_tx,
            }),
        }
    }

    /// Watches the view state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProductViewState> {
        self.shared.view_tx.subscribe()
    }

    /// Watches the add/edit form state.
    #[must_use]
    pub fn subscribe_form(&self) -> watch::Receiver<ProductFormState> {
        self.shared.form_tx.subscribe()
    }

    /// Current view state.
    #[must_use]
    pub fn view(&self) -> ProductViewState {
        self.shared.lock().view.clone()
    }

    /// Current form state.
    #[must_use]
    pub fn form(&self) -> ProductFormState {
        self.shared.lock().form.clone()
    }

    #[must_use]
    pub fn settings(&self) -> &ProductSettings {
        &self.shared.settings
    }

    /// Loads the first page of the full listing.
    ///
    /// Clears the search text, cancels any pending search and subscribes to the
    /// store's live listing. Every emission replaces the snapshot and resets
    /// the view to its first page.
    pub fn load_products(&self) {
        let _span = tracing::debug_span!("load_products").entered();

        let mut inner = self.shared.lock();
        if inner.closed {
            return;
        }
        inner.view.search_query.clear();
        self.shared.start_listing(&mut inner);
    }

    /// Appends the next cached page to the visible list.
    ///
    /// No-op while a page is being appended, in search mode, or once the
    /// snapshot is exhausted. Never contacts the store.
    pub fn load_more_products(&self) {
        let _span = tracing::debug_span!("load_more_products").entered();

        let mut inner = self.shared.lock();
        if inner.closed || inner.view.is_loading_more || !inner.view.has_more {
            return;
        }
        let Some(request) = inner.cache.begin_next_page() else {
            return;
        };

        inner.view.is_loading_more = true;
        if let Some(page) = inner.cache.finish_page(request) {
            inner.view.products.extend(page);
            inner.view.current_page = inner.cache.page_index();
        }
        inner.view.has_more = inner.cache.has_more();
        inner.view.is_loading_more = false;

        tracing::debug!(
            visible = inner.view.products.len(),
            has_more = inner.view.has_more,
            "visible list extended"
        );
        self.shared.publish(&inner);
    }

    /// Records the search text and schedules the query.
    ///
    /// A blank query restores the paginated listing immediately. Otherwise the
    /// query runs after the debounce delay unless another call supersedes it
    /// first; only one search subscription is ever active.
    pub fn search_products(&self, query: &str) {
        let _span = tracing::debug_span!("search_products", query = %query).entered();

        let mut inner = self.shared.lock();
        if inner.closed {
            return;
        }
        inner.view.search_query = query.to_string();

        if query.trim().is_empty() {
            tracing::debug!("blank query, restoring listing");
            self.shared.start_listing(&mut inner);
            return;
        }

        self.shared.publish(&inner);
        let task = Arc::clone(&self.shared)
            .run_search(query.to_string())
            .instrument(tracing::debug_span!("product_search", query = %query));
        inner.search.schedule(&self.shared.runtime, task);
    }

    /// Submits the form as a new product.
    ///
    /// On success the form is reset with a success notice and the listing is
    /// reloaded; on failure the form carries the error and the listing is left
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::Validation`] for unusable form input or a
    /// submission already in flight, and the store's error if the add fails.
    pub async fn add_product(&self) -> Result<String> {
        let product = self.begin_submission(false)?;
        let outcome = self.shared.store.add_product(product).await;

        let id = outcome.as_ref().ok().cloned();
        self.finish_submission(outcome.map(|_| ()), "Product added", "Failed to add product")?;
        id.ok_or_else(|| GestlyError::Storage("store returned no product id".to_string()))
    }

    /// Submits the form as an update of the product loaded for editing.
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::Validation`] if no product is being edited or the
    /// input is unusable, and the store's error if the update fails.
    pub async fn update_product(&self) -> Result<()> {
        let product = self.begin_submission(true)?;
        let outcome = self.shared.store.update_product(product).await;
        self.finish_submission(outcome, "Product updated", "Failed to update product")
    }

    /// Deletes a product and reloads the listing.
    ///
    /// # Errors
    ///
    /// Returns the store's error; it is also shown as a view notice.
    pub async fn delete_product(&self, id: &str) -> Result<()> {
        if self.shared.lock().closed {
            return Err(closed_error());
        }

        let outcome = self.shared.store.delete_product(id.to_string()).await;

        let mut inner = self.shared.lock();
        if inner.closed {
            return outcome;
        }
        match outcome {
            Ok(()) => {
                tracing::debug!(product_id = %id, "product deleted");
                self.shared.post_notice(&mut inner, Target::View, Notice::Success("Product deleted".to_string()));
                inner.view.search_query.clear();
                self.shared.start_listing(&mut inner);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(product_id = %id, error = %e, "delete failed");
                self.shared.post_notice(&mut inner, Target::View, Notice::Error(format!("Failed to delete product: {e}")));
                self.shared.publish(&inner);
                Err(e)
            }
        }
    }

    /// Fills the form with a cached product for editing.
    ///
    /// Looks in the snapshot first, then in the visible list (search results
    /// are not cached).
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::NotFound`] if the id is unknown; the error is also
    /// shown as a view notice.
    pub fn load_product_for_edit(&self, id: &str) -> Result<()> {
        let mut inner = self.shared.lock();

        let found: Option<Product> = inner
            .cache
            .find(id)
            .or_else(|| inner.view.find(id))
            .cloned();

        if let Some(product) = found {
            inner.form = ProductFormState::from_product(&product);
            inner.form_notice.cancel();
            self.shared.publish_form(&inner);
            Ok(())
        } else {
            let err = GestlyError::NotFound(id.to_string());
            tracing::debug!(product_id = %id, "product to edit is not cached");
            self.shared.post_notice(&mut inner, Target::View, Notice::Error(err.to_string()));
            self.shared.publish(&inner);
            Err(err)
        }
    }

    /// Applies `edit` to the form and publishes the result.
    ///
    /// ```no_run
    /// # use gestly::app::ProductController;
    /// # fn demo(controller: &ProductController) {
    /// controller.edit_form(|form| {
    ///     form.name = "Coffee beans".into();
    ///     form.stock = "10".into();
    /// });
    /// # }
    /// ```
    pub fn edit_form(&self, edit: impl FnOnce(&mut ProductFormState)) {
        let mut inner = self.shared.lock();
        edit(&mut inner.form);
        self.shared.publish_form(&inner);
    }

    /// Discards the form contents, including any edit in progress.
    pub fn reset_form(&self) {
        let mut inner = self.shared.lock();
        inner.form = ProductFormState::default();
        inner.form_notice.cancel();
        self.shared.publish_form(&inner);
    }

    /// Clears error notices on the view and the form.
    pub fn clear_error(&self) {
        let mut inner = self.shared.lock();
        inner.clear_notice(Target::View, true);
        inner.clear_notice(Target::Form, true);
        self.shared.publish(&inner);
        self.shared.publish_form(&inner);
    }

    /// Clears success notices on the view and the form.
    pub fn clear_success(&self) {
        let mut inner = self.shared.lock();
        inner.clear_notice(Target::View, false);
        inner.clear_notice(Target::Form, false);
        self.shared.publish(&inner);
        self.shared.publish_form(&inner);
    }

    /// Tears the session down.
    ///
    /// Cancels the pending search, the active subscription and notice timers,
    /// discards the cache, and publishes empty states. Later calls on the
    /// controller are ignored (mutations return an error).
    pub fn close(&self) {
        let mut inner = self.shared.lock();
        if inner.closed {
            return;
        }

        tracing::debug!("closing product controller");
        inner.closed = true;
        inner.search.cancel();
        inner.next_epoch();
        inner.view_notice.cancel();
        inner.form_notice.cancel();
        inner.cache.clear();
        inner.view = ProductViewState::default();
        inner.form = ProductFormState::default();

        self.shared.publish(&inner);
        self.shared.publish_form(&inner);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Validates the form and moves it to `Submitting`.
    fn begin_submission(&self, editing: bool) -> Result<Product> {
        let mut inner = self.shared.lock();
        if inner.closed {
            return Err(closed_error());
        }
        if inner.form.is_submitting() {
            return Err(GestlyError::Validation(
                "a submission is already in progress".to_string(),
            ));
        }

        let missing_id = inner.form.editing_id.as_deref().map_or(true, str::is_empty);
        let product = if editing && missing_id {
            Err(GestlyError::Validation("no product selected for editing".to_string()))
        } else {
            inner.form.to_product(chrono::Utc::now().timestamp_millis())
        };

        match product {
            Ok(product) => {
                inner.form.status = MutationStatus::Submitting;
                inner.form.notice = None;
                inner.form_notice.cancel();
                self.shared.publish_form(&inner);
                Ok(product)
            }
            Err(e) => {
                tracing::debug!(error = %e, "form rejected");
                inner.form.status = MutationStatus::Failed;
                self.shared.post_notice(&mut inner, Target::Form, Notice::Error(e.to_string()));
                self.shared.publish_form(&inner);
                Err(e)
            }
        }
    }

    /// Settles a submission and reloads the listing on success.
    fn finish_submission(&self, outcome: Result<()>, success: &str, failure: &str) -> Result<()> {
        let mut inner = self.shared.lock();
        if inner.closed {
            return outcome;
        }

        match outcome {
            Ok(()) => {
                tracing::debug!(notice = success, "submission succeeded");
                inner.form = ProductFormState {
                    status: MutationStatus::Succeeded,
                    ..ProductFormState::default()
                };
                self.shared.post_notice(&mut inner, Target::Form, Notice::Success(success.to_string()));
                self.shared.publish_form(&inner);

                inner.view.search_query.clear();
                self.shared.start_listing(&mut inner);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, action = failure, "submission failed");
                inner.form.status = MutationStatus::Failed;
                self.shared.post_notice(&mut inner, Target::Form, Notice::Error(format!("{failure}: {e}")));
                self.shared.publish_form(&inner);
                Err(e)
            }
        }
    }
}

impl Drop for ProductController {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ProductController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductController")
            .field("settings", &self.shared.settings)
            .finish_non_exhaustive()
    }
}

fn closed_error() -> GestlyError {
    GestlyError::Session("product session is closed".to_string())
}
