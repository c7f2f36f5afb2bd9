//! Observable view state for the product screen.
//!
//! [`ProductViewState`] is what a UI renders: the visible slice of products,
//! the search text, loading flags, pagination status and a transient
//! [`Notice`]. It is published as a whole through a `tokio::sync::watch`
//! channel every time the controller changes it, so readers always see a
//! consistent snapshot.
//!
//! # Example
//!
//! ```rust
//! use gestly::app::{Notice, ProductViewState};
//!
//! let mut state = ProductViewState::default();
//! state.notice = Some(Notice::Error("offline".into()));
//! assert_eq!(state.error_message(), Some("offline"));
//! assert_eq!(state.success_message(), None);
//! ```

use crate::domain::Product;

/// A transient user-facing message.
///
/// Error and success messages are mutually exclusive: a state holds at most one
/// notice, and posting either kind replaces the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Success(String),
}

impl Notice {
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Error(message) | Self::Success(message) => message,
        }
    }
}

/// Externally observable state of one product screen session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductViewState {
    /// Products currently visible, in display order.
    ///
    /// In listing mode this is a prefix of the cached snapshot; in search mode
    /// it is the latest search result.
    pub products: Vec<Product>,

    /// Text currently in the search box. Blank means listing mode.
    pub search_query: String,

    /// A listing or search subscription is waiting for its first result.
    pub is_loading: bool,

    /// A further page is being appended.
    pub is_loading_more: bool,

    /// Error or success message, cleared automatically after a delay.
    pub notice: Option<Notice>,

    /// More cached products exist beyond the visible ones.
    ///
    /// Always `false` while showing search results.
    pub has_more: bool,

    /// Number of pages fetched since the last listing load, `0` for search results.
    pub current_page: usize,
}

impl ProductViewState {
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.notice {
            Some(Notice::Error(message)) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn success_message(&self) -> Option<&str> {
        match &self.notice {
            Some(Notice::Success(message)) => Some(message),
            _ => None,
        }
    }

    /// Returns `true` when the search box holds non-blank text.
    #[must_use]
    pub fn is_searching(&self) -> bool {
        !self.search_query.trim().is_empty()
    }

    /// Looks up a visible product by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}
