//! Immutable order records with by-value product snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::product::Product;
use crate::types::{OrderId, UserId};

#[derive(Debug, Clone, Serialize, FromRow)]
/// Database representation of a placed order.
///
/// Orders are immutable after creation; no code path updates an order row.
pub struct Order {
    /// Unique identifier for the order.
    pub id: OrderId,
    /// Purchasing user.
    pub user_id: UserId,
    /// Purchaser's email at checkout time; kept even if the account email
    /// later changes.
    pub email: String,
    /// Line items, stored as a JSONB document.
    pub lines: Json<Vec<OrderLine>>,
    /// Checkout timestamp.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Constructs an order from snapshotted line items.
    pub fn new(user_id: UserId, email: impl Into<String>, lines: Vec<OrderLine>) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            email: email.into(),
            lines: Json(lines),
            created_at: Utc::now(),
        }
    }

    /// Total order value across all line items.
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Snapshot of one product's sellable attributes at the moment of purchase.
///
/// Decoupled by value from the live catalog: later edits or deletion of the
/// product must not change historical orders.
pub struct OrderLine {
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub image_url: String,
    pub quantity: u32,
}

impl OrderLine {
    /// Freezes `product` into a line item for `quantity` units.
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            title: product.title.clone(),
            price: product.price,
            description: product.description.clone(),
            image_url: product.image_url.clone(),
            quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::ProductPayload;

    fn product(price: &str) -> Product {
        Product::new(
            UserId::new(),
            &ProductPayload {
                title: "A Fine Book".to_string(),
                price: price.parse().unwrap(),
                description: "Paperback, 320 pages".to_string(),
                image_url: "images/fine-book.png".to_string(),
            },
        )
    }

    #[test]
    fn snapshot_copies_sellable_attributes() {
        let product = product("12.99");
        let line = OrderLine::snapshot(&product, 2);
        assert_eq!(line.title, product.title);
        assert_eq!(line.price, product.price);
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn total_sums_price_times_quantity() {
        let lines = vec![
            OrderLine::snapshot(&product("12.99"), 2),
            OrderLine::snapshot(&product("0.01"), 3),
        ];
        let order = Order::new(UserId::new(), "shopper@example.com", lines);
        assert_eq!(order.total(), "26.01".parse::<Decimal>().unwrap());
    }

    #[test]
    fn order_lines_roundtrip_through_json() {
        let line = OrderLine::snapshot(&product("9.50"), 1);
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["price"], "9.50");
        let back: OrderLine = serde_json::from_value(json).unwrap();
        assert_eq!(back, line);
    }
}
