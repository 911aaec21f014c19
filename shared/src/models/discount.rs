//! Discount primitives shared by coupons and promotions

use serde::{Deserialize, Serialize};

/// Discount type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Product applicability scope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "scope", content = "product_ids", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductScope {
    All,
    Products(Vec<i64>),
}

impl ProductScope {
    /// Check whether a product falls under this scope
    pub fn matches(&self, product_id: i64) -> bool {
        match self {
            ProductScope::All => true,
            ProductScope::Products(ids) => ids.contains(&product_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_all_matches_any() {
        assert!(ProductScope::All.matches(42));
    }

    #[test]
    fn test_scope_products_matches_listed_only() {
        let scope = ProductScope::Products(vec![1, 2, 3]);
        assert!(scope.matches(2));
        assert!(!scope.matches(4));
    }
}
