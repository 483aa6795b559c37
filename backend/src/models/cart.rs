//! Cart entries, their hydrated views, and reconciliation warnings.

use serde::{Deserialize, Serialize};

use crate::models::product::Product;
use crate::types::ProductId;

/// One (product, quantity) pair inside a user's cart document.
///
/// Entries reference products by id only; nothing prevents the product from
/// being deleted afterwards. Orphaned entries are dropped at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart entry hydrated against the live catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

/// Non-fatal notice that reconciliation removed unavailable entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartWarning {
    pub removed_product_ids: Vec<ProductId>,
    pub message: String,
}

impl CartWarning {
    pub fn removed(removed_product_ids: Vec<ProductId>) -> Self {
        Self {
            removed_product_ids,
            message: "Some items were removed from your cart automatically, \
                      because they're no longer available"
                .to_string(),
        }
    }
}

/// Result of reading a cart: hydrated items plus reconciliation warnings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub warnings: Vec<CartWarning>,
}
