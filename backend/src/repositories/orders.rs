//! Order persistence. Order creation and cart clearing commit together.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::order::Order;
use crate::types::{OrderId, UserId};

/// Result of the transactional order write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderWrite {
    /// Order row inserted and cart cleared, atomically.
    Committed,
    /// The cart changed after the snapshot was taken; nothing was written.
    CartVersionConflict,
}

/// Storage seam for orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists `order` and empties the owner's cart in one transaction.
    ///
    /// The cart clear is conditioned on `expected_cart_version`; on a
    /// version mismatch the whole write rolls back and
    /// [`OrderWrite::CartVersionConflict`] is returned so the caller can
    /// re-snapshot.
    async fn create_order_and_clear_cart(
        &self,
        order: &Order,
        expected_cart_version: i64,
    ) -> Result<OrderWrite, StoreError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// All orders placed by `user_id`, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;
}

/// Postgres-backed [`OrderStore`].
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order_and_clear_cart(
        &self,
        order: &Order,
        expected_cart_version: i64,
    ) -> Result<OrderWrite, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Clear the cart first so the version check gates the entire write.
        let cleared = sqlx::query(
            r#"
            UPDATE users
            SET cart = '[]'::jsonb, cart_version = cart_version + 1, updated_at = $2
            WHERE id = $1 AND cart_version = $3
            "#,
        )
        .bind(order.user_id)
        .bind(order.created_at)
        .bind(expected_cart_version)
        .execute(&mut *tx)
        .await?;

        if cleared.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(OrderWrite::CartVersionConflict);
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, email, lines, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.email)
        .bind(&order.lines)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(OrderWrite::Committed)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, email, lines, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, email, lines, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_order_store_can_be_created() {
        let _mock = MockOrderStore::new();
    }
}
