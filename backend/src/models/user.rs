//! User account records and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

use crate::models::cart::CartEntry;
use crate::types::{ProductId, UserId};
use crate::validation::rules;

#[derive(Debug, Clone, Serialize, FromRow)]
/// Database representation of a registered shop account.
///
/// The cart lives on the user row as a JSONB document. Cart writes go through
/// a compare-and-swap on `cart_version` so concurrent mutations from the same
/// user cannot silently overwrite each other.
pub struct User {
    /// Unique identifier for the user.
    pub id: UserId,
    /// Login email; unique across accounts.
    pub email: String,
    /// Argon2 PHC hash of the user's password; never serialized out.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Embedded cart document.
    pub cart: Json<Vec<CartEntry>>,
    /// Bumped by one on every successful cart write.
    pub cart_version: i64,
    /// SHA-256 digest of the pending reset token, if a reset is pending.
    /// Set and cleared together with `reset_token_expires_at`.
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    /// Expiry of the pending reset token.
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp for auditing.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Constructs a fresh account with an empty cart and no pending reset.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email: email.into(),
            password_hash: password_hash.into(),
            cart: Json(Vec::new()),
            cart_version: 0,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Quantity of `product_id` in the cart, if present.
    pub fn cart_quantity(&self, product_id: ProductId) -> Option<u32> {
        self.cart
            .iter()
            .find(|entry| entry.product_id == product_id)
            .map(|entry| entry.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Safe projection of an account handed to the session layer.
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: String,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
/// Payload submitted when registering an account.
pub struct SignupPayload {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(custom(function = "rules::validate_password_strength"))]
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
/// Payload submitted when completing a password reset.
pub struct UpdatePasswordPayload {
    /// Raw reset token from the recovery link.
    pub token: String,
    #[validate(custom(function = "rules::validate_password_strength"))]
    pub password: String,
    pub confirm_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_starts_with_empty_cart_and_no_reset() {
        let user = User::new("shopper@example.com", "$argon2id$stub");
        assert!(user.cart.is_empty());
        assert_eq!(user.cart_version, 0);
        assert!(user.reset_token_hash.is_none());
        assert!(user.reset_token_expires_at.is_none());
    }

    #[test]
    fn serialized_user_never_exposes_secrets() {
        let mut user = User::new("shopper@example.com", "$argon2id$stub");
        user.reset_token_hash = Some("digest".to_string());
        user.reset_token_expires_at = Some(Utc::now());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("reset_token_hash").is_none());
        assert!(json.get("reset_token_expires_at").is_none());
        assert_eq!(json["email"], "shopper@example.com");
    }

    #[test]
    fn cart_quantity_reads_matching_entry() {
        let mut user = User::new("shopper@example.com", "$argon2id$stub");
        let product_id = ProductId::new();
        user.cart.0.push(CartEntry {
            product_id,
            quantity: 3,
        });
        assert_eq!(user.cart_quantity(product_id), Some(3));
        assert_eq!(user.cart_quantity(ProductId::new()), None);
    }
}
