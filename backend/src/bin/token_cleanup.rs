//! Cron-style sweep clearing expired password reset tokens.
//!
//! Expiry is already enforced at validation time; this keeps the table tidy.

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopkeeper_backend::config::Config;
use shopkeeper_backend::db::connection::create_pool;
use shopkeeper_backend::repositories::{PgUserStore, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopkeeper_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;

    let users = PgUserStore::new(pool);
    let cleared = users.clear_expired_reset_tokens(Utc::now()).await?;
    if cleared > 0 {
        tracing::info!("Cleared {} expired password reset tokens", cleared);
    }

    Ok(())
}
