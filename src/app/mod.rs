//! Application layer: the product screen session.
//!
//! This layer sits between a front end (the CLI in `main.rs`, or any UI) and
//! the store. It keeps a cached snapshot of the catalog, pages through it,
//! debounces searches and drives add/edit/delete submissions, publishing the
//! result as observable state.
//!
//! # Architecture
//!
//! ```text
//! Front end ──calls──▶ ProductController ──▶ ProductStore (live feeds, mutations)
//!     ▲                      │
//!     └──── watch ◀──────────┘ ProductViewState / ProductFormState
//! ```
//!
//! # Modules
//!
//! - [`controller`]: Session owner, listing and search subscriptions, mutations
//! - [`pager`]: Snapshot cache and page bookkeeping
//! - [`debounce`]: Cancel-and-reschedule timer for search input
//! - [`form`]: Add/edit form state and validation
//! - [`state`]: Observable view state

pub mod controller;
pub mod debounce;
pub mod form;
pub mod pager;
pub mod state;

pub use controller::{ProductController, ProductSettings, DEFAULT_ERROR_TTL, DEFAULT_SUCCESS_TTL};
pub use debounce::{Debouncer, DEFAULT_SEARCH_DEBOUNCE};
pub use form::{MutationStatus, ProductFormState};
pub use pager::{PageRequest, SnapshotCache, DEFAULT_PAGE_SIZE};
pub use state::{Notice, ProductViewState};
