//! Cart state kept consistent against a live catalog, and the conversion of
//! a cart into a permanent order.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;

use crate::error::ShopError;
use crate::models::cart::{CartEntry, CartItem, CartView, CartWarning};
use crate::models::order::{Order, OrderLine};
use crate::models::product::Product;
use crate::models::user::User;
use crate::repositories::{CasOutcome, OrderStore, OrderWrite, ProductStore, UserStore};
use crate::types::{OrderId, ProductId, UserId};

/// Upper bound on retries for optimistic cart writes. A conflict means another
/// request for the same user won the race; the read-modify-write is re-run
/// from the top.
const MAX_CAS_ATTEMPTS: u32 = 3;

pub struct CartService {
    users: Arc<dyn UserStore>,
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
}

impl CartService {
    pub fn new(
        users: Arc<dyn UserStore>,
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            users,
            products,
            orders,
        }
    }

    /// Resolves the user's cart against the catalog.
    ///
    /// Entries whose product no longer exists are dropped from the persisted
    /// cart and reported through a non-fatal warning. Reconciliation runs on
    /// every read because products can be deleted independently of any cart
    /// mutation; the healed cart is written back only when something was
    /// actually dropped.
    pub async fn cart(&self, user_id: UserId) -> Result<CartView, ShopError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let user = self.load_user(user_id).await?;
            let catalog = self.catalog_snapshot(&user.cart).await?;
            let (kept, dropped) = reconcile(&user.cart, &catalog);

            if !dropped.is_empty() {
                let outcome = self
                    .users
                    .save_cart(user_id, &kept, user.cart_version)
                    .await
                    .map_err(|err| ShopError::operation("Failed to load cart", err))?;
                if outcome == CasOutcome::VersionConflict {
                    continue;
                }
                tracing::warn!(
                    user_id = %user_id,
                    removed = dropped.len(),
                    "cart entries dropped for products no longer in the catalog"
                );
            }

            let warnings = if dropped.is_empty() {
                Vec::new()
            } else {
                vec![CartWarning::removed(dropped)]
            };
            return Ok(CartView {
                items: hydrate(&kept, &catalog),
                warnings,
            });
        }

        Err(concurrent_update_error("Failed to load cart"))
    }

    /// Adds one unit of `product_id` to the cart: increments the quantity if
    /// the product is already present, otherwise appends a new entry.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), ShopError> {
        self.products
            .find_by_id(product_id)
            .await
            .map_err(|err| ShopError::operation("Failed to add item to cart", err))?
            .ok_or_else(|| ShopError::not_found("Product not found!"))?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            let user = self.load_user(user_id).await?;

            let mut entries = user.cart.0.clone();
            match entries.iter_mut().find(|e| e.product_id == product_id) {
                Some(entry) => entry.quantity = entry.quantity.saturating_add(1),
                None => entries.push(CartEntry {
                    product_id,
                    quantity: 1,
                }),
            }

            let outcome = self
                .users
                .save_cart(user_id, &entries, user.cart_version)
                .await
                .map_err(|err| ShopError::operation("Failed to add item to cart", err))?;
            if outcome == CasOutcome::Applied {
                return Ok(());
            }
        }

        Err(concurrent_update_error("Failed to add item to cart"))
    }

    /// Removes the entry for `product_id` entirely, whatever its quantity.
    /// Fails with `NotFound` when the product is not in the cart, so a
    /// double-submit or tampered id is distinguishable from success.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), ShopError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let user = self.load_user(user_id).await?;

            if !user.cart.iter().any(|e| e.product_id == product_id) {
                return Err(ShopError::not_found(
                    "Item not found in cart or already removed",
                ));
            }

            let entries: Vec<CartEntry> = user
                .cart
                .iter()
                .filter(|e| e.product_id != product_id)
                .cloned()
                .collect();

            let outcome = self
                .users
                .save_cart(user_id, &entries, user.cart_version)
                .await
                .map_err(|err| ShopError::operation("Failed to remove item from cart", err))?;
            if outcome == CasOutcome::Applied {
                return Ok(());
            }
        }

        Err(concurrent_update_error("Failed to remove item from cart"))
    }

    /// Empties the cart unconditionally.
    pub async fn clear(&self, user_id: UserId) -> Result<(), ShopError> {
        self.users
            .clear_cart(user_id)
            .await
            .map_err(|err| ShopError::operation("Failed to clear cart", err))
    }

    /// Converts the cart into an immutable order.
    ///
    /// Every resolved cart item is frozen into an [`OrderLine`] snapshot; the
    /// order insert and the cart clear commit together, conditioned on the
    /// cart version observed at snapshot time. If the order write fails the
    /// cart stays untouched. An empty (or fully orphaned) cart is rejected
    /// before any write.
    pub async fn create_order(&self, user_id: UserId) -> Result<OrderId, ShopError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let user = self.load_user(user_id).await?;
            let catalog = self.catalog_snapshot(&user.cart).await?;
            let (kept, _) = reconcile(&user.cart, &catalog);

            if kept.is_empty() {
                return Err(ShopError::not_found("Your cart is empty"));
            }

            let lines: Vec<OrderLine> = kept
                .iter()
                .map(|entry| OrderLine::snapshot(&catalog[&entry.product_id], entry.quantity))
                .collect();
            let order = Order::new(user.id, &user.email, lines);

            let written = self
                .orders
                .create_order_and_clear_cart(&order, user.cart_version)
                .await
                .map_err(|err| ShopError::operation("Failed to create new order", err))?;
            match written {
                OrderWrite::Committed => {
                    tracing::info!(
                        user_id = %user_id,
                        order_id = %order.id,
                        total = %order.total(),
                        "order created"
                    );
                    return Ok(order.id);
                }
                OrderWrite::CartVersionConflict => continue,
            }
        }

        Err(concurrent_update_error("Failed to create new order"))
    }

    async fn load_user(&self, user_id: UserId) -> Result<User, ShopError> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(|err| ShopError::operation("Failed to load user", err))?
            .ok_or_else(|| ShopError::not_found("User not found"))
    }

    /// Fetches the products referenced by `entries`, keyed by id. Ids that no
    /// longer resolve are simply absent from the map.
    async fn catalog_snapshot(
        &self,
        entries: &[CartEntry],
    ) -> Result<HashMap<ProductId, Product>, ShopError> {
        let ids: Vec<ProductId> = entries.iter().map(|e| e.product_id).collect();
        let products = self
            .products
            .find_many(&ids)
            .await
            .map_err(|err| ShopError::operation("Failed to load cart", err))?;
        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }
}

/// Splits `entries` into those whose product still exists in `catalog` and
/// the product ids of those that do not.
fn reconcile(
    entries: &[CartEntry],
    catalog: &HashMap<ProductId, Product>,
) -> (Vec<CartEntry>, Vec<ProductId>) {
    let (kept, orphaned): (Vec<CartEntry>, Vec<CartEntry>) = entries
        .iter()
        .cloned()
        .partition(|entry| catalog.contains_key(&entry.product_id));
    let dropped = orphaned.into_iter().map(|e| e.product_id).collect();
    (kept, dropped)
}

fn hydrate(entries: &[CartEntry], catalog: &HashMap<ProductId, Product>) -> Vec<CartItem> {
    entries
        .iter()
        .filter_map(|entry| {
            catalog.get(&entry.product_id).map(|product| CartItem {
                product: product.clone(),
                quantity: entry.quantity,
            })
        })
        .collect()
}

fn concurrent_update_error(context: &str) -> ShopError {
    ShopError::operation(context, anyhow!("cart changed concurrently on every attempt"))
}
