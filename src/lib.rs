//! Gestly: product catalog synchronization for small-business inventory clients.
//!
//! Gestly keeps a locally cached product list consistent with an authoritative
//! document store and serves it to a product screen:
//! - Live listing subscription replacing an in-memory snapshot on every change
//! - Page-by-page extension of the visible list without store round trips
//! - Debounced, cancellable name-prefix search
//! - Add, edit and delete with validation and auto-clearing notices
//! - A persisted local session scoping all of the above to one signed-in user

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Front end (main.rs CLI, or any UI)                 │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Session scope (session/)                           │  ← Services, sign in/out
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← ProductController
//! │  - Snapshot cache and pagination                    │
//! │  - Search debouncing                                │
//! │  - Form validation and mutations                    │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Store Layer (store/)                               │  ← ProductStore trait
//! │  - Live feeds over a JSON document collection       │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain, Infrastructure, Observability              │
//! │  - Product, User, errors (domain/)                  │
//! │  - Data directory (infrastructure/)                 │
//! │  - tracing + OpenTelemetry file export              │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Product controller, snapshot cache, debouncer, view and form state
//! - [`domain`]: Core domain types (Product, User, errors)
//! - [`infrastructure`]: Data directory resolution
//! - [`observability`]: Tracing subscriber and span export
//! - [`session`]: Services, signed-in sessions, persisted session file
//! - [`store`]: Store trait and the JSON document-store backend
//!
//! # Configuration
//!
//! ```toml
//! # ~/.config/gestly/config.toml
//! page_size = 20
//! search_debounce_ms = 300
//! error_notice_ms = 3000
//! success_notice_ms = 2000
//! data_dir = "~/shop-data"
//! trace_level = "debug"
//! ```
//!
//! Every key is optional. Individual keys can be overridden with `key=value`
//! pairs (see [`Config::apply_overrides`]).
//!
//! # Example
//!
//! ```no_run
//! use gestly::{initialize, Config, User};
//!
//! # async fn demo() -> gestly::Result<()> {
//! let services = initialize(&Config::default())?;
//! let session = match services.resume()? {
//!     Some(session) => session,
//!     None => services.sign_in(User::new("u-1", "Ana Ruiz", "ana@example.com"))?,
//! };
//!
//! let mut view = session.products().subscribe();
//! session.products().load_products();
//! view.changed().await.ok();
//! println!("{} products", view.borrow().products.len());
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod session;
pub mod store;

pub use app::{
    MutationStatus, Notice, ProductController, ProductFormState, ProductSettings, ProductViewState,
};
pub use domain::{GestlyError, Product, Result, StockStatus, User, WeightUnit};
pub use session::{Services, Session, SessionManager};
pub use store::{JsonProductStore, ProductStore};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// File name of the product collection inside the data directory.
pub const PRODUCTS_FILE_NAME: &str = "products.json";

/// File name of the persisted session inside the data directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Client configuration.
///
/// Loaded from TOML with per-field defaults, then optionally overridden by
/// `key=value` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Products per page of the listing. Default: 20
    pub page_size: usize,

    /// Delay between the last search keystroke and the query. Default: 300
    pub search_debounce_ms: u64,

    /// How long error notices stay visible. Default: 3000
    pub error_notice_ms: u64,

    /// How long success notices stay visible. Default: 2000
    pub success_notice_ms: u64,

    /// Directory for the product store, session and trace files.
    ///
    /// `~` is expanded. Defaults to [`infrastructure::get_data_dir`].
    pub data_dir: Option<String>,

    /// Log level when `RUST_LOG` is unset.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: app::DEFAULT_PAGE_SIZE,
            search_debounce_ms: 300,
            error_notice_ms: 3000,
            success_notice_ms: 2000,
            data_dir: None,
            trace_level: None,
        }
    }
}

impl Config {
    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::Config`] on malformed TOML, unknown keys or
    /// values of the wrong type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gestly::Config;
    ///
    /// let config = Config::from_toml_str("page_size = 50\ntrace_level = \"debug\"")?;
    /// assert_eq!(config.page_size, 50);
    /// assert_eq!(config.search_debounce_ms, 300);
    /// # Ok::<(), gestly::GestlyError>(())
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| GestlyError::Config(e.to_string()))
    }

    /// Loads configuration from `path` if given, then applies `overrides`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>, overrides: &BTreeMap<String, String>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::debug!(path = ?path, "loading configuration");
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    GestlyError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        Ok(config)
    }

    /// Builds a configuration from defaults plus `key=value` pairs.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use gestly::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("page_size".to_string(), "10".to_string());
    /// map.insert("search_debounce_ms".to_string(), "soon".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.page_size, 10);
    /// assert_eq!(config.search_debounce_ms, 300);
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let mut config = Self::default();
        config.apply_overrides(map);
        config
    }

    /// Overrides fields from `key=value` pairs.
    ///
    /// # Parsing Rules
    ///
    /// - numeric keys: values that do not parse (or a zero page size) are ignored
    /// - `data_dir`, `trace_level`: blank values are ignored
    /// - unknown keys are logged and ignored
    pub fn apply_overrides(&mut self, map: &BTreeMap<String, String>) {
        for (key, value) in map {
            let value = value.trim();
            match key.as_str() {
                "page_size" => {
                    if let Some(size) = value.parse().ok().filter(|&size: &usize| size > 0) {
                        self.page_size = size;
                    }
                }
                "search_debounce_ms" => parse_into(value, &mut self.search_debounce_ms),
                "error_notice_ms" => parse_into(value, &mut self.error_notice_ms),
                "success_notice_ms" => parse_into(value, &mut self.success_notice_ms),
                "data_dir" if !value.is_empty() => self.data_dir = Some(value.to_string()),
                "trace_level" if !value.is_empty() => self.trace_level = Some(value.to_string()),
                "data_dir" | "trace_level" => {}
                other => tracing::debug!(key = other, "ignoring unknown configuration key"),
            }
        }
    }

    /// Resolved data directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.as_deref().map_or_else(infrastructure::get_data_dir, |dir| {
            PathBuf::from(infrastructure::expand_tilde(dir))
        })
    }

    /// Controller tunables derived from this configuration.
    #[must_use]
    pub fn product_settings(&self) -> ProductSettings {
        ProductSettings {
            page_size: self.page_size.max(1),
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            error_ttl: Duration::from_millis(self.error_notice_ms),
            success_ttl: Duration::from_millis(self.success_notice_ms),
        }
    }
}

fn parse_into(value: &str, field: &mut u64) {
    if let Ok(parsed) = value.parse() {
        *field = parsed;
    }
}

/// Builds the process services from configuration.
///
/// Opens the file-backed product store and the session file in the data
/// directory, creating it if needed. Tracing is set up separately with
/// [`observability::init_tracing`].
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or an existing
/// product or session file is malformed.
pub fn initialize(config: &Config) -> Result<Services> {
    let data_dir = config.data_dir();
    tracing::debug!(data_dir = ?data_dir, "initializing gestly services");

    let store = JsonProductStore::open(data_dir.join(PRODUCTS_FILE_NAME))?;
    let sessions = SessionManager::open(data_dir.join(SESSION_FILE_NAME))?;

    Ok(Services::new(Arc::new(store), sessions, config.product_settings()))
}
