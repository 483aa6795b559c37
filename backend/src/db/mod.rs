//! Database pool construction and embedded migrations.

pub mod connection;

pub use connection::create_pool;

/// Applies all pending migrations from `migrations/`.
///
/// Invoked by the embedding application at bootstrap; the library itself
/// never migrates implicitly.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
