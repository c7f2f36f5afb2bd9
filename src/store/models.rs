//! Stored document representation of products.
//!
//! [`ProductDocument`] is what the document store keeps per product. It mirrors
//! the field names used by the hosted catalog (`purchasePrice`, `weightUnit`, …)
//! and tolerates missing fields by falling back to defaults, so a partially
//! written document still loads. The identifier is the document key, not a field.

use crate::domain::{Product, WeightUnit};
use serde::{Deserialize, Serialize};

/// A product as stored in the document collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDocument {
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

impl ProductDocument {
    /// Builds a document from a product, dropping its id.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            purchase_price: product.purchase_price,
            selling_price: product.selling_price,
            stock: product.stock,
            net_weight: product.net_weight,
            weight_unit: product.weight_unit,
            branch: product.branch.clone(),
            purchase_date: product.purchase_date,
            upload_date: product.upload_date,
            edit_date: product.edit_date,
        }
    }

    /// Materializes the document as a product with the given key as its id.
    #[must_use]
    pub fn to_product(&self, id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: self.name.clone(),
            purchase_price: self.purchase_price,
            selling_price: self.selling_price,
            stock: self.stock,
            net_weight: self.net_weight,
            weight_unit: self.weight_unit,
            branch: self.branch.clone(),
            purchase_date: self.purchase_date,
            upload_date: self.upload_date,
            edit_date: self.edit_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_hosted_field_names() {
        let doc = ProductDocument {
            name: "Oil".into(),
            weight_unit: WeightUnit::Ml,
            purchase_date: Some(1_700_000_000_000),
            ..ProductDocument::default()
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["weightUnit"], "ML");
        assert_eq!(json["purchaseDate"], 1_700_000_000_000_i64);
        assert!(json.get("purchase_price").is_none());
        assert!(json.get("purchasePrice").is_some());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let doc: ProductDocument = serde_json::from_str(r#"{ "name": "Flour", "stock": 4 }"#).unwrap();
        let product = doc.to_product("abc");

        assert_eq!(product.id, "abc");
        assert_eq!(product.name, "Flour");
        assert_eq!(product.stock, 4);
        assert_eq!(product.weight_unit, WeightUnit::Mg);
        assert!(product.purchase_date.is_none());
    }
}
