//! Catalog product record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CurrencyCode, Price, ProductId};

/// A purchasable product as delivered by the catalog endpoint.
///
/// Field names match the wire format (`product_id`, `image_url`, ...).
/// `price` accepts either a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
}

impl Product {
    /// Unit price in the given currency.
    #[must_use]
    pub const fn unit_price(&self, currency: CurrencyCode) -> Price {
        Price::new(self.price, currency)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_numeric_price() {
        let json = r#"{
            "product_id": 1,
            "name": "Masala Chai",
            "price": 99.99,
            "category": "Beverages",
            "description": "Spiced tea",
            "image_url": "https://example.com/chai.jpg"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.product_id, ProductId::new(1));
        assert_eq!(product.price, Decimal::new(9999, 2));
        assert_eq!(product.category, "Beverages");
    }

    #[test]
    fn test_deserialize_string_price_and_missing_optionals() {
        let json = r#"{"product_id": 2, "name": "Samosa", "price": "5.50", "category": "Snacks"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, Decimal::new(550, 2));
        assert!(product.description.is_empty());
        assert!(product.image_url.is_empty());
    }

    #[test]
    fn test_unit_price() {
        let json = r#"{"product_id": 2, "name": "Samosa", "price": 5.5, "category": "Snacks"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.unit_price(CurrencyCode::INR).display(), "₹5.50");
    }
}
