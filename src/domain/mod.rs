//! Domain layer: products, users, and errors.
//!
//! These types carry no knowledge of the store backend or of the async
//! controller. Derived product figures (profit, margin, stock status) live here
//! so every caller computes them the same way.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`product`]: Product model, weight units, stock classification
//! - [`user`]: Signed-in user model
//!
//! # Examples
//!
//! ```
//! use gestly::domain::{Product, StockStatus};
//!
//! let product = Product { stock: 10, ..Product::new("Tea", 100.0, 150.0) };
//! assert_eq!(product.profit_margin(), 50.0);
//! assert_eq!(product.stock_status(), StockStatus::Normal);
//! ```

pub mod error;
pub mod product;
pub mod user;

pub use error::{GestlyError, Result};
pub use product::{Product, StockStatus, WeightUnit};
pub use user::User;
