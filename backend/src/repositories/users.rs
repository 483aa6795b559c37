//! User persistence: account rows, the embedded cart document, and the
//! reset-token columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::cart::CartEntry;
use crate::models::user::User;
use crate::types::UserId;

/// Outcome of a compare-and-swap cart write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The stored version matched and the write was applied.
    Applied,
    /// The cart changed since it was read (or the row is gone); nothing was
    /// written and the caller should re-run its read-modify-write.
    VersionConflict,
}

/// Storage seam for user accounts.
///
/// Mockable with mockall; `MemoryStore` provides the reference in-memory
/// implementation used by the test-suite.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Replaces the cart document if `expected_version` still matches,
    /// bumping the version by one.
    async fn save_cart(
        &self,
        user_id: UserId,
        entries: &[CartEntry],
        expected_version: i64,
    ) -> Result<CasOutcome, StoreError>;

    /// Unconditionally empties the cart.
    async fn clear_cart(&self, user_id: UserId) -> Result<(), StoreError>;

    /// Stores a reset-token digest and its expiry, superseding any previous
    /// pending token.
    async fn set_reset_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Finds the user whose pending token digest matches and whose expiry is
    /// still in the future.
    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError>;

    /// Writes the new password hash and clears both token columns in one
    /// update, conditioned on the digest still matching. Returns `false`
    /// when no row matched (token consumed or superseded in the meantime).
    async fn update_password_and_clear_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError>;

    /// Clears token columns whose expiry has passed; returns the number of
    /// rows swept.
    async fn clear_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Maps a unique violation on `users.email` to [`StoreError::Conflict`], the
/// same signal the in-memory store emits, so the caller sees one conflict
/// contract regardless of backend. Everything else stays a database error.
fn map_unique_violation(err: sqlx::Error, email: &str) -> StoreError {
    if err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        return StoreError::Conflict(format!("duplicate email: {email}"));
    }
    StoreError::Database(err)
}

/// Postgres-backed [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, cart, cart_version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.cart)
        .bind(user.cart_version)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| map_unique_violation(err, &user.email))?;

        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, cart, cart_version,
                   reset_token_hash, reset_token_expires_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, cart, cart_version,
                   reset_token_hash, reset_token_expires_at, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save_cart(
        &self,
        user_id: UserId,
        entries: &[CartEntry],
        expected_version: i64,
    ) -> Result<CasOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET cart = $2, cart_version = cart_version + 1, updated_at = $3
            WHERE id = $1 AND cart_version = $4
            "#,
        )
        .bind(user_id)
        .bind(Json(entries))
        .bind(Utc::now())
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(CasOutcome::VersionConflict);
        }

        Ok(CasOutcome::Applied)
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET cart = '[]'::jsonb, cart_version = cart_version + 1, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_reset_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token_hash = $2, reset_token_expires_at = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, cart, cart_version,
                   reset_token_hash, reset_token_expires_at, created_at, updated_at
            FROM users
            WHERE reset_token_hash = $1
            AND reset_token_expires_at > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_password_and_clear_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $3,
                reset_token_hash = NULL,
                reset_token_expires_at = NULL,
                updated_at = $4
            WHERE id = $1 AND reset_token_hash = $2
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(new_password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_token_hash = NULL, reset_token_expires_at = NULL, updated_at = $2
            WHERE reset_token_expires_at IS NOT NULL AND reset_token_expires_at <= $1
            "#,
        )
        .bind(now)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
