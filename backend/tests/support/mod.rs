#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Duration;
use url::Url;

use shopkeeper_backend::models::product::{Product, ProductPayload};
use shopkeeper_backend::models::user::{AuthenticatedUser, SignupPayload};
use shopkeeper_backend::repositories::MemoryStore;
use shopkeeper_backend::services::{AuthService, CartService, CatalogService, OrderService};
use shopkeeper_backend::types::UserId;
use shopkeeper_backend::utils::email::Mailer;

pub const TEST_PASSWORD: &str = "letmein-please";
pub const BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct RecordedEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Mailer double that records every delivery instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<RecordedEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<RecordedEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> RecordedEmail {
        self.sent().last().cloned().expect("no email was sent")
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                html_body: html_body.to_string(),
            });
        Ok(())
    }
}

/// Mailer double whose every delivery fails.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _html_body: &str) -> Result<()> {
        Err(anyhow!("smtp unavailable"))
    }
}

/// All services wired over one shared in-memory store and recording mailer.
pub struct TestShop {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub auth: AuthService,
    pub cart: CartService,
    pub catalog: CatalogService,
    pub orders: OrderService,
}

pub fn shop() -> TestShop {
    shop_with_ttl(Duration::hours(1))
}

pub fn shop_with_ttl(reset_token_ttl: Duration) -> TestShop {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let auth = AuthService::new(
        store.clone(),
        mailer.clone(),
        reset_token_ttl,
        Url::parse(BASE_URL).expect("base url"),
    );
    let cart = CartService::new(store.clone(), store.clone(), store.clone());
    let catalog = CatalogService::new(store.clone(), 3);
    let orders = OrderService::new(store.clone());
    TestShop {
        store,
        mailer,
        auth,
        cart,
        catalog,
        orders,
    }
}

/// An auth service over the same store whose mailer always fails.
pub fn auth_with_failing_mailer(shop: &TestShop) -> AuthService {
    AuthService::new(
        shop.store.clone(),
        Arc::new(FailingMailer),
        Duration::hours(1),
        Url::parse(BASE_URL).expect("base url"),
    )
}

pub async fn signed_up_user(shop: &TestShop, email: &str) -> AuthenticatedUser {
    shop.auth
        .signup(&SignupPayload {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            confirm_password: TEST_PASSWORD.to_string(),
        })
        .await
        .expect("signup failed")
}

pub async fn seeded_product(shop: &TestShop, owner: UserId, title: &str, price: &str) -> Product {
    shop.catalog
        .create(
            owner,
            &ProductPayload {
                title: title.to_string(),
                price: price.parse().expect("bad price literal"),
                description: format!("{title} in excellent condition"),
                image_url: "images/item.png".to_string(),
            },
        )
        .await
        .expect("seeding product failed")
}

/// Pulls the raw reset token out of a recovery email body.
pub fn extract_reset_token(html_body: &str) -> String {
    let marker = "reset-password/";
    let start = html_body.find(marker).expect("no reset link in email body") + marker.len();
    html_body[start..start + 64].to_string()
}
