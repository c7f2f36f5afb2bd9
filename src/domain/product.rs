//! Product domain model.
//!
//! A [`Product`] is one catalog entry as the client sees it. Prices, stock and
//! weight are stored as entered; profit figures and the stock classification are
//! derived on demand and never persisted.
//!
//! All timestamps are Unix epoch offsets in milliseconds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stock at or below this level is out of stock.
const OUT_OF_STOCK_MAX: i32 = 0;

/// Stock at or below this level is critical.
const CRITICAL_STOCK_MAX: i32 = 2;

/// Stock at or below this level is low.
const LOW_STOCK_MAX: i32 = 5;

/// Unit the net weight of a product is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeightUnit {
    /// Milligram-class units (solids).
    #[default]
    #[serde(rename = "MG")]
    Mg,
    /// Milliliter-class units (liquids).
    #[serde(rename = "ML")]
    Ml,
}

impl WeightUnit {
    /// Short label shown next to the net weight.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Mg => "mg",
            Self::Ml => "ml",
        }
    }

    /// Parses a unit from either its label (`mg`) or its stored code (`MG`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mg" => Some(Self::Mg),
            "ml" => Some(Self::Ml),
            _ => None,
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Severity classification of the remaining stock.
///
/// Variants are ordered from most to least severe, so `OutOfStock < Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    OutOfStock,
    Critical,
    Low,
    Normal,
}

impl StockStatus {
    /// Classifies a stock quantity.
    ///
    /// ```
    /// use gestly::StockStatus;
    ///
    /// assert_eq!(StockStatus::from_stock(0), StockStatus::OutOfStock);
    /// assert_eq!(StockStatus::from_stock(2), StockStatus::Critical);
    /// assert_eq!(StockStatus::from_stock(5), StockStatus::Low);
    /// assert_eq!(StockStatus::from_stock(6), StockStatus::Normal);
    /// ```
    #[must_use]
    pub const fn from_stock(stock: i32) -> Self {
        if stock <= OUT_OF_STOCK_MAX {
            Self::OutOfStock
        } else if stock <= CRITICAL_STOCK_MAX {
            Self::Critical
        } else if stock <= LOW_STOCK_MAX {
            Self::Low
        } else {
            Self::Normal
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OutOfStock => "out of stock",
            Self::Critical => "critical",
            Self::Low => "low",
            Self::Normal => "normal",
        }
    }
}

/// A catalog product.
///
/// # Fields
///
/// - `id`: store-assigned identifier, empty until the product has been added
/// - `purchase_price` / `selling_price`: unit prices
/// - `stock`: units on hand (not clamped, negative values classify as out of stock)
/// - `net_weight` + `weight_unit`: package contents
/// - `purchase_date`: when the stock was bought, if recorded
/// - `upload_date` / `edit_date`: creation and last modification times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub purchase_price: f64,
    pub selling_price: f64,
    pub stock: i32,
    pub net_weight: f64,
    pub weight_unit: WeightUnit,
    pub branch: String,
    pub purchase_date: Option<i64>,
    pub upload_date: i64,
    pub edit_date: i64,
}

impl Default for Product {
    fn default() -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: String::new(),
            name: String::new(),
            purchase_price: 0.0,
            selling_price: 0.0,
            stock: 0,
            net_weight: 0.0,
            weight_unit: WeightUnit::default(),
            branch: String::new(),
            purchase_date: None,
            upload_date: now,
            edit_date: now,
        }
    }
}

impl Product {
    /// Creates an unsaved product with the given name and prices.
    ///
    /// Remaining fields take their defaults; `upload_date` and `edit_date` are
    /// set to the current time.
    ///
    /// ```
    /// use gestly::Product;
    ///
    /// let product = Product::new("Coffee beans", 100.0, 150.0);
    /// assert!(!product.is_persisted());
    /// assert_eq!(product.profit(), 50.0);
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>, purchase_price: f64, selling_price: f64) -> Self {
        Self {
            name: name.into(),
            purchase_price,
            selling_price,
            ..Self::default()
        }
    }

    /// Returns `true` once the store has assigned an identifier.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    #[must_use]
    pub fn profit(&self) -> f64 {
        self.selling_price - self.purchase_price
    }

    /// Profit as a percentage of the purchase price.
    ///
    /// Returns `0.0` when the purchase price is zero or negative.
    #[must_use]
    pub fn profit_margin(&self) -> f64 {
        if self.purchase_price > 0.0 {
            self.profit() / self.purchase_price * 100.0
        } else {
            0.0
        }
    }

    #[must_use]
    pub const fn stock_status(&self) -> StockStatus {
        StockStatus::from_stock(self.stock)
    }

    /// Badge flag used by product lists, stricter than [`StockStatus::Low`].
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock < LOW_STOCK_MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stocked(stock: i32) -> Product {
        Product {
            stock,
            ..Product::new("Soap", 100.0, 150.0)
        }
    }

    #[test]
    fn derives_profit_and_margin() {
        let product = stocked(10);
        assert!((product.profit() - 50.0).abs() < f64::EPSILON);
        assert!((product.profit_margin() - 50.0).abs() < f64::EPSILON);
        assert_eq!(product.stock_status(), StockStatus::Normal);
    }

    #[test]
    fn margin_is_zero_without_purchase_price() {
        let free = Product::new("Sample", 0.0, 20.0);
        assert!((free.profit_margin()).abs() < f64::EPSILON);

        let negative = Product::new("Refund", -5.0, 20.0);
        assert!((negative.profit_margin()).abs() < f64::EPSILON);
    }

    #[test]
    fn stock_status_boundaries() {
        assert_eq!(stocked(-3).stock_status(), StockStatus::OutOfStock);
        assert_eq!(stocked(0).stock_status(), StockStatus::OutOfStock);
        assert_eq!(stocked(1).stock_status(), StockStatus::Critical);
        assert_eq!(stocked(2).stock_status(), StockStatus::Critical);
        assert_eq!(stocked(3).stock_status(), StockStatus::Low);
        assert_eq!(stocked(5).stock_status(), StockStatus::Low);
        assert_eq!(stocked(6).stock_status(), StockStatus::Normal);
    }

    #[test]
    fn stock_status_is_ordered_by_severity() {
        assert!(StockStatus::OutOfStock < StockStatus::Critical);
        assert!(StockStatus::Critical < StockStatus::Low);
        assert!(StockStatus::Low < StockStatus::Normal);
    }

    #[test]
    fn low_stock_badge_excludes_five() {
        assert!(stocked(4).is_low_stock());
        assert!(!stocked(5).is_low_stock());
    }

    #[test]
    fn weight_unit_parses_labels_and_codes() {
        assert_eq!(WeightUnit::parse("mg"), Some(WeightUnit::Mg));
        assert_eq!(WeightUnit::parse("ML"), Some(WeightUnit::Ml));
        assert_eq!(WeightUnit::parse("kg"), None);
        assert_eq!(WeightUnit::Ml.to_string(), "ml");
    }
}
