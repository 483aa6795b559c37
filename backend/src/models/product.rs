//! Catalog product records and their input payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::Page;
use crate::types::{ProductId, UserId};
use crate::validation::rules;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
/// Database representation of a sellable catalog product.
pub struct Product {
    /// Unique identifier for the product.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price; exact decimal, never floating point.
    pub price: Decimal,
    /// Short description shown on listing and detail pages.
    pub description: String,
    /// Reference to the stored product image; upload handling lives outside
    /// this crate.
    pub image_url: String,
    /// Owning user; only the owner may edit or delete the product.
    pub user_id: UserId,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp for auditing.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Constructs a product owned by `owner` from a validated payload.
    pub fn new(owner: UserId, payload: &ProductPayload) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            title: payload.title.clone(),
            price: payload.price,
            description: payload.description.clone(),
            image_url: payload.image_url.clone(),
            user_id: owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One page of catalog products plus navigation data.
pub type ProductPage = Page<Product>;

#[derive(Debug, Clone, Deserialize, Validate)]
/// Payload submitted when creating or editing a product.
pub struct ProductPayload {
    #[validate(length(min = 3, message = "Title must be at least 3 characters long"))]
    pub title: String,
    #[validate(custom(function = "rules::validate_price"))]
    pub price: Decimal,
    #[validate(length(
        min = 3,
        max = 128,
        message = "Description must be between 3 and 128 characters"
    ))]
    pub description: String,
    #[validate(length(min = 1, message = "Image reference must not be empty"))]
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ProductPayload {
        ProductPayload {
            title: "A Fine Book".to_string(),
            price: "12.99".parse().unwrap(),
            description: "Paperback, 320 pages".to_string(),
            image_url: "images/fine-book.png".to_string(),
        }
    }

    #[test]
    fn product_price_serializes_as_exact_string() {
        let product = Product::new(UserId::new(), &payload());
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"], "12.99");
    }

    #[test]
    fn payload_rejects_negative_price() {
        let mut bad = payload();
        bad.price = "-1.00".parse().unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn payload_rejects_short_title() {
        let mut bad = payload();
        bad.title = "ab".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn payload_accepts_valid_input() {
        assert!(payload().validate().is_ok());
    }
}
