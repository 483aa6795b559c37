//! Read-side order queries and invoice descriptors.

use std::sync::Arc;

use crate::error::ShopError;
use crate::models::order::Order;
use crate::repositories::OrderStore;
use crate::types::{OrderId, UserId};

/// An order together with the canonical name of its invoice document.
/// Rendering the PDF itself happens outside this crate.
#[derive(Debug, Clone)]
pub struct Invoice {
    pub order: Order,
    pub file_name: String,
}

pub struct OrderService {
    orders: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// All orders placed by `user_id`, newest first.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, ShopError> {
        self.orders
            .list_for_user(user_id)
            .await
            .map_err(|err| ShopError::operation("Failed to load orders", err))
    }

    /// Resolves an order for invoice download.
    ///
    /// A missing order and an order owned by someone else fail identically,
    /// so responses do not reveal which order ids exist.
    pub async fn invoice(&self, user_id: UserId, order_id: OrderId) -> Result<Invoice, ShopError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await
            .map_err(|err| ShopError::operation("Failed to load order", err))?
            .ok_or_else(|| ShopError::not_found("No order found"))?;

        if order.user_id != user_id {
            tracing::warn!(
                order_id = %order_id,
                requester = %user_id,
                "invoice requested for another user's order"
            );
            return Err(ShopError::not_found("No order found"));
        }

        Ok(Invoice {
            file_name: format!("invoice-{}.pdf", order.id),
            order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::OrderLine;
    use crate::models::product::{Product, ProductPayload};
    use crate::repositories::MockOrderStore;

    #[tokio::test]
    async fn invoice_carries_the_canonical_file_name() {
        let owner = UserId::new();
        let product = Product::new(
            owner,
            &ProductPayload {
                title: "Walnut Chair".to_string(),
                price: "49.00".parse().unwrap(),
                description: "Solid wood, oiled finish".to_string(),
                image_url: "images/chair.png".to_string(),
            },
        );
        let order = Order::new(owner, "shopper@example.com", vec![OrderLine::snapshot(&product, 1)]);
        let order_id = order.id;

        let mut orders = MockOrderStore::new();
        orders
            .expect_find_by_id()
            .returning(move |_| Ok(Some(order.clone())));

        let service = OrderService::new(Arc::new(orders));
        let invoice = service.invoice(owner, order_id).await.unwrap();
        assert_eq!(invoice.file_name, format!("invoice-{order_id}.pdf"));
    }
}
