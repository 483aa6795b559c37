//! Product catalog: paginated listings and owner-scoped mutations.

use std::sync::Arc;

use crate::error::ShopError;
use crate::models::product::{Product, ProductPage, ProductPayload};
use crate::models::{Page, Pagination};
use crate::repositories::{ProductStore, UpdateOutcome};
use crate::types::{ProductId, UserId};
use crate::validation::Validate;

/// Outcome of an owner-scoped edit, for the caller's flash messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReport {
    Updated,
    NoChanges,
}

pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    products_per_page: i64,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>, products_per_page: i64) -> Self {
        Self {
            products,
            products_per_page,
        }
    }

    /// One page of the catalog, newest first. `page` is 1-based; `None` and
    /// values below 1 fall back to the first page, while a page past the end
    /// lists nothing. `owner` narrows the listing to that user's products.
    pub async fn page(
        &self,
        page: Option<i64>,
        owner: Option<UserId>,
    ) -> Result<ProductPage, ShopError> {
        let current = page.unwrap_or(1).max(1);
        let (items, total) = self
            .products
            .page(current, self.products_per_page, owner)
            .await
            .map_err(|err| ShopError::operation("Failed to load products", err))?;

        Ok(Page {
            pagination: Pagination::new(current, self.products_per_page, total),
            items,
        })
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, ShopError> {
        self.products
            .find_by_id(id)
            .await
            .map_err(|err| ShopError::operation("Failed to load product", err))?
            .ok_or_else(|| ShopError::not_found("Product not found!"))
    }

    pub async fn create(
        &self,
        owner: UserId,
        payload: &ProductPayload,
    ) -> Result<Product, ShopError> {
        payload.validate()?;

        let product = Product::new(owner, payload);
        self.products
            .insert(&product)
            .await
            .map_err(|err| ShopError::operation("Failed to create product", err))?;
        tracing::info!(product_id = %product.id, owner = %owner, "product created");
        Ok(product)
    }

    /// Owner-scoped edit. Zero-match (absent or owned by someone else) fails
    /// with `NotFound`; an edit that changes nothing is reported distinctly.
    pub async fn update(
        &self,
        owner: UserId,
        id: ProductId,
        changes: &ProductPayload,
    ) -> Result<UpdateReport, ShopError> {
        changes.validate()?;

        let outcome = self
            .products
            .update_owned(id, owner, changes)
            .await
            .map_err(|err| ShopError::operation("Failed to update product", err))?;
        match outcome {
            UpdateOutcome::Updated => {
                tracing::info!(product_id = %id, owner = %owner, "product updated");
                Ok(UpdateReport::Updated)
            }
            UpdateOutcome::Unchanged => Ok(UpdateReport::NoChanges),
            UpdateOutcome::NotMatched => Err(ShopError::not_found(
                "Product not found or you don't have permission to edit it",
            )),
        }
    }

    /// Owner-scoped delete. Returns the deleted row so the caller can clean
    /// up the image file. Orders keep their snapshots; cart entries pointing
    /// at the product are left to read-time reconciliation.
    pub async fn delete(&self, owner: UserId, id: ProductId) -> Result<Product, ShopError> {
        let deleted = self
            .products
            .delete_owned(id, owner)
            .await
            .map_err(|err| ShopError::operation("Failed to delete product", err))?
            .ok_or_else(|| {
                ShopError::not_found("Deleting product failed. Please try again later")
            })?;
        tracing::info!(product_id = %id, owner = %owner, "product deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::repositories::MockProductStore;

    fn payload() -> ProductPayload {
        ProductPayload {
            title: "Walnut Chair".to_string(),
            price: "49.00".parse().unwrap(),
            description: "Solid wood, oiled finish".to_string(),
            image_url: "images/chair.png".to_string(),
        }
    }

    #[tokio::test]
    async fn update_zero_match_is_not_found() {
        let mut products = MockProductStore::new();
        products
            .expect_update_owned()
            .returning(|_, _, _| Ok(UpdateOutcome::NotMatched));

        let service = CatalogService::new(Arc::new(products), 3);
        let err = service
            .update(UserId::new(), ProductId::new(), &payload())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn page_defaults_to_the_first_page() {
        let mut products = MockProductStore::new();
        products
            .expect_page()
            .withf(|page, per_page, owner| *page == 1 && *per_page == 3 && owner.is_none())
            .returning(|_, _, _| Ok((Vec::new(), 0)));

        let service = CatalogService::new(Arc::new(products), 3);
        let page = service.page(None, None).await.unwrap();
        assert_eq!(page.pagination.current_page, 1);
        assert!(page.items.is_empty());
    }
}
