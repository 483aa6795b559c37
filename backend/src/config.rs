use anyhow::anyhow;
use chrono::Duration;
use std::env;
use url::Url;

/// Runtime configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Base URL the shop is served under; used when composing links in
    /// outbound email. Should end with a slash if the shop lives on a subpath.
    pub app_base_url: Url,
    /// Lifetime of a password-reset token, in seconds.
    pub reset_token_ttl_seconds: i64,
    /// Catalog page size for paginated listings.
    pub products_per_page: i64,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_from: String,
    /// Skip actual SMTP delivery; useful for local runs without a relay.
    pub smtp_skip_send: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost:5432/shopkeeper".to_string());

        let app_base_url_raw =
            env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let app_base_url = Url::parse(&app_base_url_raw)
            .map_err(|_| anyhow!("Invalid APP_BASE_URL value: {}", app_base_url_raw))?;

        let reset_token_ttl_seconds = env::var("RESET_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        let products_per_page = env::var("PRODUCTS_PER_PAGE")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .unwrap_or(3);

        let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string());
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .unwrap_or(587);
        let smtp_username = env::var("SMTP_USERNAME").unwrap_or_default();
        let smtp_password = env::var("SMTP_PASSWORD").unwrap_or_default();
        let smtp_from = env::var("SMTP_FROM")
            .unwrap_or_else(|_| "noreply@shopkeeper.local".to_string());
        let smtp_skip_send = env::var("SMTP_SKIP_SEND").unwrap_or_default() == "true";

        Ok(Config {
            database_url,
            app_base_url,
            reset_token_ttl_seconds,
            products_per_page,
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            smtp_from,
            smtp_skip_send,
        })
    }

    /// Reset-token lifetime as a duration.
    pub fn reset_token_ttl(&self) -> Duration {
        Duration::seconds(self.reset_token_ttl_seconds)
    }
}
