// tests/cart_tests.rs
mod common;

use async_trait::async_trait;
use common::*;
use darkroom::catalog::{CANVAS_PRINT_SET, PORTRAIT_SESSION_PRINTS, PREMIUM_PRINT_COLLECTION, WEDDING_ALBUM_LUXURY};
use darkroom::models::{CartItem, NewOrder, NewOrderItem, Order, OrderItem, OrderLine, OrderStatus, Product};
use darkroom::pricing::MAX_LINE_QUANTITY;
use darkroom::store::StoreResult;
use darkroom::{CartStore, MemoryStore, ShopError, ShopStore, StoreOp};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

async fn open_cart(store: &Arc<MemoryStore>) -> CartStore {
  CartStore::open(as_shop_store(store), Uuid::new_v4()).await.unwrap()
}

#[tokio::test]
async fn adding_twice_merges_into_one_line() {
  setup_tracing();
  let store = seeded_store();
  let cart = open_cart(&store).await;

  cart.add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();
  cart.add_to_cart(PREMIUM_PRINT_COLLECTION, 2).await.unwrap();

  let items = cart.items();
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].quantity, 3);
  assert_eq!(cart.cart_count(), 3);
  assert_eq!(cart.cart_total().unwrap(), 3 * 4500);
  assert!(!cart.is_loading());
}

#[tokio::test]
async fn totals_follow_price_times_quantity() {
  setup_tracing();
  let store = seeded_store();
  let cart = open_cart(&store).await;

  cart.add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();
  cart.add_to_cart(PORTRAIT_SESSION_PRINTS, 2).await.unwrap();

  assert_eq!(cart.cart_total().unwrap(), 11500);
  assert_eq!(cart.cart_count(), 3);
  let summary = cart.summary().unwrap();
  assert_eq!((summary.subtotal_cents, summary.tax_cents, summary.total_cents), (11500, 1150, 12650));
}

#[tokio::test]
async fn update_quantity_sets_and_zero_removes() {
  setup_tracing();
  let store = seeded_store();
  let cart = open_cart(&store).await;
  cart.add_to_cart(CANVAS_PRINT_SET, 1).await.unwrap();

  cart.update_quantity(CANVAS_PRINT_SET, 4).await.unwrap();
  assert_eq!(cart.cart_count(), 4);

  cart.update_quantity(CANVAS_PRINT_SET, 0).await.unwrap();
  assert!(cart.is_empty());
  assert_eq!(cart.cart_count(), 0);
  assert_eq!(cart.cart_total().unwrap(), 0);
}

#[tokio::test]
async fn removing_the_last_item_empties_the_cart() {
  setup_tracing();
  let store = seeded_store();
  let cart = open_cart(&store).await;
  cart.add_to_cart(PORTRAIT_SESSION_PRINTS, 2).await.unwrap();

  cart.remove_from_cart(PORTRAIT_SESSION_PRINTS).await.unwrap();

  assert_eq!(cart.cart_count(), 0);
  assert_eq!(cart.cart_total().unwrap(), 0);
  assert!(store.list_cart_items(cart.user_id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejects_bad_input() {
  setup_tracing();
  let store = seeded_store();
  let cart = open_cart(&store).await;

  let err = cart.add_to_cart(PREMIUM_PRINT_COLLECTION, 0).await.unwrap_err();
  assert!(matches!(err, ShopError::Validation(_)));

  let err = cart.add_to_cart(Uuid::new_v4(), 1).await.unwrap_err();
  assert!(matches!(err, ShopError::NotFound { entity: "Product", .. }));

  let err = cart.update_quantity(PREMIUM_PRINT_COLLECTION, 2).await.unwrap_err();
  assert!(matches!(err, ShopError::NotFound { entity: "Cart item", .. }));

  assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn failed_mutation_keeps_previous_lines() {
  setup_tracing();
  let store = seeded_store();
  let cart = open_cart(&store).await;
  cart.add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();

  store.fail_on(StoreOp::UpsertCartItem);
  let err = cart.update_quantity(PREMIUM_PRINT_COLLECTION, 5).await.unwrap_err();
  assert!(matches!(err, ShopError::Store(_)));
  assert_eq!(cart.cart_count(), 1);

  store.recover(StoreOp::UpsertCartItem);
  cart.update_quantity(PREMIUM_PRINT_COLLECTION, 5).await.unwrap();
  assert_eq!(cart.cart_count(), 5);
}

#[tokio::test]
async fn carts_are_kept_apart_per_user() {
  setup_tracing();
  let store = seeded_store();
  let first = open_cart(&store).await;
  let second = open_cart(&store).await;

  first.add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();
  second.add_to_cart(PREMIUM_PRINT_COLLECTION, 2).await.unwrap();
  first.clear().await.unwrap();

  assert_eq!(first.cart_count(), 0);
  second.refresh().await.unwrap();
  assert_eq!(second.cart_count(), 2);
}

#[tokio::test]
async fn quantities_beyond_the_line_limit_are_rejected() {
  setup_tracing();
  let store = seeded_store();
  let cart = open_cart(&store).await;

  let err = cart.add_to_cart(WEDDING_ALBUM_LUXURY, 1_000_000_000_000_000).await.unwrap_err();
  assert!(matches!(err, ShopError::Validation(_)));
  assert_eq!(store.write_count(), 0);

  cart.add_to_cart(PREMIUM_PRINT_COLLECTION, MAX_LINE_QUANTITY).await.unwrap();
  for extra in [1, i64::MAX] {
    let err = cart.add_to_cart(PREMIUM_PRINT_COLLECTION, extra).await.unwrap_err();
    assert!(matches!(err, ShopError::Validation(_)));
  }
  let err = cart
    .update_quantity(PREMIUM_PRINT_COLLECTION, MAX_LINE_QUANTITY + 1)
    .await
    .unwrap_err();
  assert!(matches!(err, ShopError::Validation(_)));

  assert_eq!(cart.cart_count(), MAX_LINE_QUANTITY);
  assert_eq!(cart.cart_total().unwrap(), MAX_LINE_QUANTITY * 4500);
  assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn lines_whose_total_would_not_fit_are_refused() {
  setup_tracing();
  let gallery_wall = Product::new(
    Uuid::new_v4(),
    "Gallery Wall Commission",
    None,
    i64::MAX / 50,
    None,
    "Prints",
    false,
  )
  .unwrap();
  let store = Arc::new(MemoryStore::with_products(vec![gallery_wall.clone()]));
  let cart = open_cart(&store).await;

  cart.add_to_cart(gallery_wall.id, 1).await.unwrap();
  let err = cart.add_to_cart(gallery_wall.id, 5).await.unwrap_err();
  assert!(matches!(err, ShopError::Validation(_)));
  let err = cart.update_quantity(gallery_wall.id, 6).await.unwrap_err();
  assert!(matches!(err, ShopError::Validation(_)));

  assert_eq!(cart.cart_count(), 1);
  assert!(cart.summary().is_ok());
}

/// Delegates to a memory store; the next cart listing can be made to stall after it has read
/// the rows, so its answer arrives late.
struct StallingStore {
  inner: Arc<MemoryStore>,
  stall_next_listing: AtomicBool,
}

#[async_trait]
impl ShopStore for StallingStore {
  async fn list_products(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
    self.inner.list_products(category).await
  }

  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
    self.inner.get_product(product_id).await
  }

  async fn list_cart_items(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>> {
    let items = self.inner.list_cart_items(user_id).await?;
    if self.stall_next_listing.swap(false, Ordering::SeqCst) {
      tokio::time::sleep(Duration::from_millis(60)).await;
    }
    Ok(items)
  }

  async fn upsert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i64) -> StoreResult<CartItem> {
    self.inner.upsert_cart_item(user_id, product_id, quantity).await
  }

  async fn delete_cart_item(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool> {
    self.inner.delete_cart_item(user_id, product_id).await
  }

  async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()> {
    self.inner.clear_cart(user_id).await
  }

  async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
    self.inner.insert_order(order).await
  }

  async fn get_order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
    self.inner.get_order(order_id).await
  }

  async fn update_order_status(&self, order_id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>> {
    self.inner.update_order_status(order_id, status).await
  }

  async fn delete_order(&self, order_id: Uuid) -> StoreResult<()> {
    self.inner.delete_order(order_id).await
  }

  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> StoreResult<Vec<OrderItem>> {
    self.inner.insert_order_items(items).await
  }

  async fn list_order_lines(&self, order_id: Uuid) -> StoreResult<Vec<OrderLine>> {
    self.inner.list_order_lines(order_id).await
  }
}

#[tokio::test]
async fn a_late_reload_does_not_overwrite_a_newer_one() {
  setup_tracing();
  let memory = seeded_store();
  let store = Arc::new(StallingStore {
    inner: memory.clone(),
    stall_next_listing: AtomicBool::new(false),
  });
  let cart = CartStore::open(store.clone(), Uuid::new_v4()).await.unwrap();
  assert!(cart.is_empty());

  // The first reload reads the empty cart, then stalls. Meanwhile a line is written and a
  // second reload picks it up.
  store.stall_next_listing.store(true, Ordering::SeqCst);
  let (slow, fast) = tokio::join!(cart.refresh(), async {
    tokio::time::sleep(Duration::from_millis(10)).await;
    memory
      .upsert_cart_item(cart.user_id(), CANVAS_PRINT_SET, 2)
      .await
      .unwrap();
    cart.refresh().await
  });
  slow.unwrap();
  fast.unwrap();

  assert_eq!(cart.cart_count(), 2);
  assert!(!cart.is_loading());
}
