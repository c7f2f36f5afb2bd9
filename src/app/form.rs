//! Add/edit product form state and validation.
//!
//! The form holds raw text exactly as typed; conversion into a [`Product`]
//! happens once, at submission, and fails with
//! [`GestlyError::Validation`](crate::GestlyError::Validation) on blank or
//! non-numeric input.
//!
//! # State Machine
//!
//! ```text
//! Idle ──submit──▶ Submitting ──ok──▶ Succeeded ──delay──▶ Idle
//!                      │
//!                      └──err──▶ Failed ──delay──▶ Idle
//! ```
//!
//! A failed submission is never retried automatically.

use super::state::Notice;
use crate::domain::error::{GestlyError, Result};
use crate::domain::{Product, WeightUnit};

/// Lifecycle of a single add/update submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Transient state of the add/edit product form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFormState {
    pub name: String,
    pub purchase_price: String,
    pub selling_price: String,
    pub stock: String,
    pub net_weight: String,
    pub weight_unit: WeightUnit,
    pub branch: String,
    /// Epoch milliseconds.
    pub purchase_date: Option<i64>,

    /// Id of the product being edited, `None` when adding.
    pub editing_id: Option<String>,
    /// Original upload time of the product being edited.
    pub upload_date: Option<i64>,

    pub status: MutationStatus,
    pub notice: Option<Notice>,
}

impl ProductFormState {
    /// Pre-fills the form for editing an existing product.
    ///
    /// ```
    /// use gestly::app::ProductFormState;
    /// use gestly::Product;
    ///
    /// let product = Product { id: "p-1".into(), stock: 7, ..Product::new("Salt", 1.5, 2.0) };
    /// let form = ProductFormState::from_product(&product);
    ///
    /// assert_eq!(form.editing_id.as_deref(), Some("p-1"));
    /// assert_eq!(form.stock, "7");
    /// assert_eq!(form.purchase_price, "1.5");
    /// ```
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            purchase_price: product.purchase_price.to_string(),
            selling_price: product.selling_price.to_string(),
            stock: product.stock.to_string(),
            net_weight: product.net_weight.to_string(),
            weight_unit: product.weight_unit,
            branch: product.branch.clone(),
            purchase_date: product.purchase_date,
            editing_id: Some(product.id.clone()),
            upload_date: Some(product.upload_date),
            status: MutationStatus::Idle,
            notice: None,
        }
    }

    /// Every required text field is non-blank.
    #[must_use]
    pub fn is_form_valid(&self) -> bool {
        [
            &self.name,
            &self.purchase_price,
            &self.selling_price,
            &self.stock,
            &self.net_weight,
            &self.branch,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self.status, MutationStatus::Submitting)
    }

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

    /// Converts the typed values into a product.
    ///
    /// The id is taken from `editing_id` (empty when adding). `now` stamps the
    /// edit date, and the upload date of new products.
    ///
    /// # Errors
    ///
    /// Returns [`GestlyError::Validation`] if a required field is blank or a
    /// numeric field does not parse.
    pub fn to_product(&self, now: i64) -> Result<Product> {
        if !self.is_form_valid() {
            return Err(GestlyError::Validation(
                "all product fields are required".to_string(),
            ));
        }

        Ok(Product {
            id: self.editing_id.clone().unwrap_or_default(),
            name: self.name.trim().to_string(),
            purchase_price: parse_number("purchase price", &self.purchase_price)?,
            selling_price: parse_number("selling price", &self.selling_price)?,
            stock: self
                .stock
                .trim()
                .parse()
                .map_err(|_| GestlyError::Validation(format!("stock is not a whole number: {}", self.stock)))?,
            net_weight: parse_number("net weight", &self.net_weight)?,
            weight_unit: self.weight_unit,
            branch: self.branch.trim().to_string(),
            purchase_date: self.purchase_date,
            upload_date: self.upload_date.unwrap_or(now),
            edit_date: now,
        })
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| GestlyError::Validation(format!("{field} is not a number: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ProductFormState {
        ProductFormState {
            name: " Coffee ".into(),
            purchase_price: "100".into(),
            selling_price: "150".into(),
            stock: "10".into(),
            net_weight: "500".into(),
            weight_unit: WeightUnit::Mg,
            branch: "Centro".into(),
            ..ProductFormState::default()
        }
    }

    #[test]
    fn converts_valid_input() {
        let product = filled().to_product(42).unwrap();

        assert!(product.id.is_empty());
        assert_eq!(product.name, "Coffee");
        assert_eq!(product.stock, 10);
        assert_eq!(product.upload_date, 42);
        assert_eq!(product.edit_date, 42);
        assert!((product.profit_margin() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn blank_field_fails_validation() {
        let form = ProductFormState {
            branch: "   ".into(),
            ..filled()
        };
        assert!(!form.is_form_valid());
        assert!(matches!(form.to_product(0), Err(GestlyError::Validation(_))));
    }

    #[test]
    fn non_numeric_price_fails_validation() {
        let form = ProductFormState {
            purchase_price: "cien".into(),
            ..filled()
        };
        let err = form.to_product(0).unwrap_err();
        assert!(err.to_string().contains("purchase price"));

        let form = ProductFormState {
            stock: "2.5".into(),
            ..filled()
        };
        assert!(matches!(form.to_product(0), Err(GestlyError::Validation(_))));

        let form = ProductFormState {
            net_weight: "NaN".into(),
            ..filled()
        };
        assert!(matches!(form.to_product(0), Err(GestlyError::Validation(_))));
    }

    #[test]
    fn editing_keeps_id_and_upload_date() {
        let original = Product {
            id: "p-9".into(),
            upload_date: 7,
            ..Product::new("Tea", 2.0, 3.0)
        };
        let mut form = ProductFormState::from_product(&original);
        form.stock = "4".into();
        form.branch = "Norte".into();
        form.net_weight = "100".into();

        let product = form.to_product(99).unwrap();
        assert_eq!(product.id, "p-9");
        assert_eq!(product.upload_date, 7);
        assert_eq!(product.edit_date, 99);
        assert_eq!(product.stock, 4);
    }
}
