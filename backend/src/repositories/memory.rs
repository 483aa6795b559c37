//! In-memory store implementing every storage seam, used by the integration
//! tests in `tests/` to exercise the services without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use crate::error::StoreError;
use crate::models::cart::CartEntry;
use crate::models::order::Order;
use crate::models::product::{Product, ProductPayload};
use crate::models::user::User;
use crate::repositories::orders::{OrderStore, OrderWrite};
use crate::repositories::products::{ProductStore, UpdateOutcome};
use crate::repositories::users::{CasOutcome, UserStore};
use crate::types::{OrderId, ProductId, UserId};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    // Vec keeps insertion order, which doubles as chronological order.
    products: Vec<Product>,
    orders: Vec<Order>,
    order_writes_to_fail: u32,
}

/// Thread-safe in-memory [`UserStore`] + [`ProductStore`] + [`OrderStore`].
///
/// Write behavior mirrors the Postgres implementations: conditional updates
/// that match no row report a conflict (or `false`) instead of erroring.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next `count` order writes fail as if storage were down.
    pub fn fail_next_order_writes(&self, count: u32) {
        self.state().order_writes_to_fail = count;
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "duplicate email: {}",
                user.email
            )));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn save_cart(
        &self,
        user_id: UserId,
        entries: &[CartEntry],
        expected_version: i64,
    ) -> Result<CasOutcome, StoreError> {
        let mut state = self.state();
        match state.users.get_mut(&user_id) {
            Some(user) if user.cart_version == expected_version => {
                user.cart = Json(entries.to_vec());
                user.cart_version += 1;
                user.updated_at = Utc::now();
                Ok(CasOutcome::Applied)
            }
            _ => Ok(CasOutcome::VersionConflict),
        }
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), StoreError> {
        if let Some(user) = self.state().users.get_mut(&user_id) {
            user.cart = Json(Vec::new());
            user.cart_version += 1;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_reset_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(user) = self.state().users.get_mut(&user_id) {
            user.reset_token_hash = Some(token_hash.to_string());
            user.reset_token_expires_at = Some(expires_at);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| {
                u.reset_token_hash.as_deref() == Some(token_hash)
                    && u.reset_token_expires_at.map_or(false, |at| at > now)
            })
            .cloned())
    }

    async fn update_password_and_clear_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut state = self.state();
        match state.users.get_mut(&user_id) {
            Some(user) if user.reset_token_hash.as_deref() == Some(token_hash) => {
                user.password_hash = new_password_hash.to_string();
                user.reset_token_hash = None;
                user.reset_token_expires_at = None;
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut cleared = 0;
        for user in self.state().users.values_mut() {
            if user.reset_token_expires_at.map_or(false, |at| at <= now) {
                user.reset_token_hash = None;
                user.reset_token_expires_at = None;
                user.updated_at = Utc::now();
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        self.state().products.push(product.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self
            .state()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .state()
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn page(
        &self,
        page: i64,
        per_page: i64,
        owner: Option<UserId>,
    ) -> Result<(Vec<Product>, i64), StoreError> {
        let state = self.state();
        let matching: Vec<&Product> = state
            .products
            .iter()
            .rev()
            .filter(|p| owner.map_or(true, |o| p.user_id == o))
            .collect();
        let total = matching.len() as i64;
        let offset = page.saturating_sub(1).saturating_mul(per_page).max(0) as usize;
        let items = matching
            .into_iter()
            .skip(offset)
            .take(per_page.max(0) as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn update_owned(
        &self,
        id: ProductId,
        owner: UserId,
        changes: &ProductPayload,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut state = self.state();
        let Some(product) = state
            .products
            .iter_mut()
            .find(|p| p.id == id && p.user_id == owner)
        else {
            return Ok(UpdateOutcome::NotMatched);
        };

        let unchanged = product.title == changes.title
            && product.price == changes.price
            && product.description == changes.description
            && product.image_url == changes.image_url;
        if unchanged {
            return Ok(UpdateOutcome::Unchanged);
        }

        product.title = changes.title.clone();
        product.price = changes.price;
        product.description = changes.description.clone();
        product.image_url = changes.image_url.clone();
        product.updated_at = Utc::now();
        Ok(UpdateOutcome::Updated)
    }

    async fn delete_owned(
        &self,
        id: ProductId,
        owner: UserId,
    ) -> Result<Option<Product>, StoreError> {
        let mut state = self.state();
        let position = state
            .products
            .iter()
            .position(|p| p.id == id && p.user_id == owner);
        Ok(position.map(|at| state.products.remove(at)))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order_and_clear_cart(
        &self,
        order: &Order,
        expected_cart_version: i64,
    ) -> Result<OrderWrite, StoreError> {
        let mut state = self.state();
        if state.order_writes_to_fail > 0 {
            state.order_writes_to_fail -= 1;
            return Err(StoreError::Unavailable(
                "injected order write failure".to_string(),
            ));
        }

        match state.users.get_mut(&order.user_id) {
            Some(user) if user.cart_version == expected_cart_version => {
                user.cart = Json(Vec::new());
                user.cart_version += 1;
                user.updated_at = order.created_at;
            }
            _ => return Ok(OrderWrite::CartVersionConflict),
        }

        state.orders.push(order.clone());
        Ok(OrderWrite::Committed)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.state().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .state()
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}
