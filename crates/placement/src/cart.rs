use common::{ProductId, Variant};
use serde::{Deserialize, Serialize};

/// One requested line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub variant: Variant,
    pub quantity: u32,
    /// Label used when the catalog has no entry for the product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

impl CartLine {
    pub fn new(product_id: impl Into<ProductId>, variant: Variant, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            variant,
            quantity,
            product_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_without_name() {
        let line: CartLine =
            serde_json::from_str(r#"{"product_id":"P1","variant":"50ml","quantity":3}"#).unwrap();
        assert_eq!(line, CartLine::new("P1", Variant::Ml50, 3));
    }

    #[test]
    fn test_unknown_variant_is_rejected() {
        let result: Result<CartLine, _> =
            serde_json::from_str(r#"{"product_id":"P1","variant":"75ml","quantity":3}"#);
        assert!(result.is_err());
    }
}
