//! Product persistence and owner-scoped catalog mutations.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::product::{Product, ProductPayload};
use crate::types::{ProductId, UserId};

/// Distinguishes "no matching row" from "matched but nothing changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Unchanged,
    NotMatched,
}

/// Storage seam for the product catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: &Product) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Resolves a set of ids; ids without a live product are simply absent
    /// from the result.
    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError>;

    /// One 1-based page, newest first, plus the total row count. `owner`
    /// narrows the listing to that user's products.
    async fn page(
        &self,
        page: i64,
        per_page: i64,
        owner: Option<UserId>,
    ) -> Result<(Vec<Product>, i64), StoreError>;

    /// Owner-scoped update. Reports zero-match distinctly from zero-change.
    async fn update_owned(
        &self,
        id: ProductId,
        owner: UserId,
        changes: &ProductPayload,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Owner-scoped delete; returns the removed row when one matched.
    async fn delete_owned(
        &self,
        id: ProductId,
        owner: UserId,
    ) -> Result<Option<Product>, StoreError>;
}

/// Postgres-backed [`ProductStore`].
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, title, price, description, image_url, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id)
        .bind(&product.title)
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.user_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, title, price, description, image_url, user_id, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, title, price, description, image_url, user_id, created_at, updated_at
            FROM products
            WHERE id = ANY($1)
            "#,
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn page(
        &self,
        page: i64,
        per_page: i64,
        owner: Option<UserId>,
    ) -> Result<(Vec<Product>, i64), StoreError> {
        let owner_uuid = owner.map(|o| *o.as_uuid());
        // Saturates instead of overflowing on hostile page numbers; a page
        // past the end is an empty result, not an error.
        let offset = page.saturating_sub(1).saturating_mul(per_page);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, title, price, description, image_url, user_id, created_at, updated_at
            FROM products
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_uuid)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE ($1::uuid IS NULL OR user_id = $1)
            "#,
        )
        .bind(owner_uuid)
        .fetch_one(&self.pool)
        .await?;

        Ok((products, total))
    }

    async fn update_owned(
        &self,
        id: ProductId,
        owner: UserId,
        changes: &ProductPayload,
    ) -> Result<UpdateOutcome, StoreError> {
        // The row-value comparison keeps a no-op edit from touching the row,
        // so "nothing changed" is observable via rows_affected.
        let result = sqlx::query(
            r#"
            UPDATE products
            SET title = $3, price = $4, description = $5, image_url = $6, updated_at = $7
            WHERE id = $1 AND user_id = $2
            AND (title, price, description, image_url) IS DISTINCT FROM ($3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&changes.title)
        .bind(changes.price)
        .bind(&changes.description)
        .bind(&changes.image_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(UpdateOutcome::Updated);
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Ok(UpdateOutcome::Unchanged)
        } else {
            Ok(UpdateOutcome::NotMatched)
        }
    }

    async fn delete_owned(
        &self,
        id: ProductId,
        owner: UserId,
    ) -> Result<Option<Product>, StoreError> {
        let deleted = sqlx::query_as::<_, Product>(
            r#"
            DELETE FROM products
            WHERE id = $1 AND user_id = $2
            RETURNING id, title, price, description, image_url, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deleted)
    }
}
