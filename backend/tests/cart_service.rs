mod support;

use shopkeeper_backend::error::ErrorKind;
use shopkeeper_backend::types::ProductId;
use support::{seeded_product, shop, signed_up_user};

#[tokio::test]
async fn adding_the_same_product_twice_increments_quantity() {
    let shop = shop();
    let user = signed_up_user(&shop, "shopper@example.com").await;
    let product = seeded_product(&shop, user.id, "Walnut Chair", "49.00").await;

    shop.cart.add(user.id, product.id).await.unwrap();
    shop.cart.add(user.id, product.id).await.unwrap();

    let view = shop.cart.cart(user.id).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].product.id, product.id);
    assert_eq!(view.items[0].quantity, 2);
    assert!(view.warnings.is_empty());
}

#[tokio::test]
async fn adding_an_unknown_product_fails_and_leaves_the_cart_unchanged() {
    let shop = shop();
    let user = signed_up_user(&shop, "shopper@example.com").await;
    let product = seeded_product(&shop, user.id, "Walnut Chair", "49.00").await;
    shop.cart.add(user.id, product.id).await.unwrap();

    let err = shop.cart.add(user.id, ProductId::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Product not found!");

    let view = shop.cart.cart(user.id).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 1);
}

#[tokio::test]
async fn removing_a_product_not_in_the_cart_fails() {
    let shop = shop();
    let user = signed_up_user(&shop, "shopper@example.com").await;
    let in_cart = seeded_product(&shop, user.id, "Walnut Chair", "49.00").await;
    let never_added = seeded_product(&shop, user.id, "Desk Lamp", "24.00").await;
    shop.cart.add(user.id, in_cart.id).await.unwrap();

    let err = shop
        .cart
        .remove(user.id, never_added.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Item not found in cart or already removed");

    let view = shop.cart.cart(user.id).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].product.id, in_cart.id);
}

#[tokio::test]
async fn remove_drops_exactly_that_entry() {
    let shop = shop();
    let user = signed_up_user(&shop, "shopper@example.com").await;
    let first = seeded_product(&shop, user.id, "Walnut Chair", "49.00").await;
    let second = seeded_product(&shop, user.id, "Desk Lamp", "24.00").await;
    shop.cart.add(user.id, first.id).await.unwrap();
    shop.cart.add(user.id, second.id).await.unwrap();
    shop.cart.add(user.id, second.id).await.unwrap();

    shop.cart.remove(user.id, first.id).await.unwrap();

    let view = shop.cart.cart(user.id).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].product.id, second.id);
    assert_eq!(view.items[0].quantity, 2);
}

#[tokio::test]
async fn deleted_product_is_dropped_with_a_warning_and_stays_gone() {
    let shop = shop();
    let user = signed_up_user(&shop, "shopper@example.com").await;
    let doomed = seeded_product(&shop, user.id, "Walnut Chair", "49.00").await;
    let kept = seeded_product(&shop, user.id, "Desk Lamp", "24.00").await;
    shop.cart.add(user.id, doomed.id).await.unwrap();
    shop.cart.add(user.id, kept.id).await.unwrap();

    shop.catalog.delete(user.id, doomed.id).await.unwrap();

    let view = shop.cart.cart(user.id).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].product.id, kept.id);
    assert_eq!(view.warnings.len(), 1);
    assert_eq!(view.warnings[0].removed_product_ids, vec![doomed.id]);

    // The healed cart was persisted: the next read is clean.
    let again = shop.cart.cart(user.id).await.unwrap();
    assert_eq!(again.items.len(), 1);
    assert!(again.warnings.is_empty());
}

#[tokio::test]
async fn clear_empties_the_cart() {
    let shop = shop();
    let user = signed_up_user(&shop, "shopper@example.com").await;
    let product = seeded_product(&shop, user.id, "Walnut Chair", "49.00").await;
    shop.cart.add(user.id, product.id).await.unwrap();

    shop.cart.clear(user.id).await.unwrap();

    let view = shop.cart.cart(user.id).await.unwrap();
    assert!(view.items.is_empty());
    assert!(view.warnings.is_empty());
}
