//! Snapshot cache and page bookkeeping.
//!
//! [`SnapshotCache`] owns the most recent full listing received from the store
//! and hands out bounded, non-overlapping slices of it. It never talks to the
//! store: extending the visible list is purely an in-memory operation.
//!
//! # Paging Model
//!
//! `page_index` counts pages already handed out. After [`SnapshotCache::replace`]
//! it is 1 (the first page), and every applied [`PageRequest`] advances it by
//! one. More items remain while `page_index * page_size < len`.
//!
//! Fetching another page is split in two steps so a caller can never append the
//! same slice twice:
//!
//! 1. [`SnapshotCache::begin_next_page`] reserves the next slice and sets the
//!    loading-more guard; further calls return `None` until it is released
//! 2. [`SnapshotCache::finish_page`] releases the guard and returns the slice,
//!    or nothing if the snapshot was replaced in between

use crate::domain::Product;
use std::ops::Range;

/// Default number of products per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A reserved slice of a specific snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    generation: u64,
    range: Range<usize>,
}

impl PageRequest {
    /// The slice bounds within the snapshot.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }
}

/// In-memory holder of the full product snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    snapshot: Vec<Product>,
    page_size: usize,
    page_index: usize,
    /// Incremented on every replace, used to reject stale page requests.
    generation: u64,
    loading_more: bool,
}

impl SnapshotCache {
    /// Creates an empty cache. A `page_size` of zero is treated as one.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            snapshot: Vec::new(),
            page_size: page_size.max(1),
            page_index: 0,
            generation: 0,
            loading_more: false,
        }
    }

    /// Replaces the snapshot and returns its first page.
    ///
    /// Resets the page index to 1 and cancels any outstanding page request.
    ///
    /// ```
    /// use gestly::app::SnapshotCache;
    /// use gestly::Product;
    ///
    /// let mut cache = SnapshotCache::new(20);
    /// let products: Vec<Product> = (0..45).map(|i| Product::new(format!("p{i}"), 1.0, 2.0)).collect();
    ///
    /// let first = cache.replace(products);
    /// assert_eq!(first.len(), 20);
    /// assert!(cache.has_more());
    /// ```
    pub fn replace(&mut self, products: Vec<Product>) -> Vec<Product> {
        let _span = tracing::debug_span!("snapshot_replace", total = products.len()).entered();

        self.snapshot = products;
        self.generation = self.generation.wrapping_add(1);
        self.loading_more = false;
        self.page_index = 1;

        let end = self.page_size.min(self.snapshot.len());
        tracing::debug!(visible = end, has_more = self.has_more(), "snapshot replaced");
        self.snapshot[..end].to_vec()
    }

    /// Returns `true` while the snapshot holds items beyond the pages handed out.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.page_index.saturating_mul(self.page_size) < self.snapshot.len()
    }

    /// Returns `true` between `begin_next_page` and `finish_page`.
    #[must_use]
    pub const fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    /// Reserves the next page.
    ///
    /// Returns `None` if a page is already being loaded or nothing remains.
    pub fn begin_next_page(&mut self) -> Option<PageRequest> {
        if self.loading_more || !self.has_more() {
            tracing::debug!(
                loading_more = self.loading_more,
                has_more = self.has_more(),
                "next page not available"
            );
            return None;
        }

        let start = self.page_index * self.page_size;
        let end = (start + self.page_size).min(self.snapshot.len());
        self.loading_more = true;

        Some(PageRequest {
            generation: self.generation,
            range: start..end,
        })
    }

    /// Completes a reserved page and returns its products.
    ///
    /// Returns `None` if the snapshot was replaced after the request was taken;
    /// the page index is left untouched in that case.
    pub fn finish_page(&mut self, request: PageRequest) -> Option<Vec<Product>> {
        if request.generation != self.generation {
            tracing::debug!("discarding page request for a replaced snapshot");
            return None;
        }

        self.loading_more = false;
        self.page_index += 1;

        let page = self.snapshot[request.range].to_vec();
        tracing::debug!(
            page_index = self.page_index,
            appended = page.len(),
            has_more = self.has_more(),
            "page loaded"
        );
        Some(page)
    }

    /// Number of pages handed out since the last replace.
    #[must_use]
    pub const fn page_index(&self) -> usize {
        self.page_index
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Total number of cached products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Looks up a cached product by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Product> {
        self.snapshot.iter().find(|p| p.id == id)
    }

    /// Discards the snapshot and all paging state.
    pub fn clear(&mut self) {
        self.snapshot.clear();
        self.generation = self.generation.wrapping_add(1);
        self.page_index = 0;
        self.loading_more = false;
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products(n: usize) -> Vec<Product> {
        (0..n)
            .map(|i| Product {
                id: format!("id-{i}"),
                ..Product::new(format!("product {i}"), 1.0, 2.0)
            })
            .collect()
    }

    fn load_next(cache: &mut SnapshotCache) -> Option<Vec<Product>> {
        let request = cache.begin_next_page()?;
        cache.finish_page(request)
    }

    #[test]
    fn first_page_is_bounded_by_page_size() {
        for n in [0, 1, 19, 20, 21, 45, 100] {
            let mut cache = SnapshotCache::new(20);
            let first = cache.replace(products(n));
            assert_eq!(first.len(), n.min(20), "n = {n}");
            assert_eq!(cache.has_more(), n > 20, "n = {n}");
            assert_eq!(cache.page_index(), 1);
        }
    }

    #[test]
    fn forty_five_products_drain_in_three_pages() {
        let mut cache = SnapshotCache::new(20);
        let mut visible = cache.replace(products(45));
        assert_eq!(visible.len(), 20);
        assert!(cache.has_more());

        visible.extend(load_next(&mut cache).unwrap());
        assert_eq!(visible.len(), 40);
        assert!(cache.has_more());

        visible.extend(load_next(&mut cache).unwrap());
        assert_eq!(visible.len(), 45);
        assert!(!cache.has_more());

        assert!(load_next(&mut cache).is_none());
        assert_eq!(visible, products(45));
    }

    #[test]
    fn exact_multiple_keeps_more_until_last_page() {
        let mut cache = SnapshotCache::new(20);
        cache.replace(products(40));
        assert!(cache.has_more());

        let second = load_next(&mut cache).unwrap();
        assert_eq!(second.len(), 20);
        assert!(!cache.has_more());
    }

    #[test]
    fn empty_listing_has_nothing_more() {
        let mut cache = SnapshotCache::new(20);
        assert!(cache.replace(Vec::new()).is_empty());
        assert!(!cache.has_more());
        assert!(cache.begin_next_page().is_none());
    }

    #[test]
    fn outstanding_request_blocks_a_second_one() {
        let mut cache = SnapshotCache::new(20);
        cache.replace(products(60));

        let first = cache.begin_next_page().unwrap();
        assert!(cache.is_loading_more());
        assert!(cache.begin_next_page().is_none());

        let page = cache.finish_page(first).unwrap();
        assert_eq!(page[0].id, "id-20");
        assert_eq!(cache.page_index(), 2);

        let next = cache.begin_next_page().unwrap();
        assert_eq!(next.range(), 40..60);
    }

    #[test]
    fn request_for_replaced_snapshot_is_discarded() {
        let mut cache = SnapshotCache::new(20);
        cache.replace(products(50));

        let stale = cache.begin_next_page().unwrap();
        cache.replace(products(30));

        assert!(cache.finish_page(stale).is_none());
        assert_eq!(cache.page_index(), 1);
        assert!(!cache.is_loading_more());
        assert_eq!(load_next(&mut cache).unwrap().len(), 10);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let mut cache = SnapshotCache::new(0);
        assert_eq!(cache.replace(products(3)).len(), 1);
        assert!(cache.has_more());
    }

    #[test]
    fn find_and_clear() {
        let mut cache = SnapshotCache::default();
        cache.replace(products(25));
        assert_eq!(cache.find("id-24").map(|p| p.name.as_str()), Some("product 24"));

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.find("id-24").is_none());
        assert!(!cache.has_more());
    }
}
