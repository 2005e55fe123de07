// tests/checkout_tests.rs
mod common;

use common::*;
use darkroom::catalog::{DIGITAL_GALLERY, PORTRAIT_SESSION_PRINTS, PREMIUM_PRINT_COLLECTION, WEDDING_ALBUM_LUXURY};
use darkroom::models::{OrderStatus, Product};
use darkroom::pricing::MAX_LINE_QUANTITY;
use darkroom::{
  CheckoutConfig, MemoryStore, PaymentOutcome, PendingGateway, ShopError, ShopSession, ShopStore, StoreOp,
};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
async fn creates_one_order_and_one_item_per_line() {
  setup_tracing();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  let cart = session.cart().unwrap();
  cart.add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();
  cart.add_to_cart(PORTRAIT_SESSION_PRINTS, 2).await.unwrap();

  let receipt = orchestrator(&store).create_order(&session).await.unwrap();

  assert_eq!(receipt.order.total_amount_cents, 12650);
  assert_eq!(receipt.order.status, OrderStatus::Pending);
  assert_eq!(receipt.order.currency, "usd");
  assert_eq!(receipt.order.user_id, session.identity().unwrap().user_id);
  assert_eq!(receipt.items.len(), 2);
  assert_eq!(store.order_count(), 1);
  assert_eq!(store.order_item_count(), 2);
  assert_eq!(receipt.redirect, format!("/checkout/{}", receipt.order.id));

  let prints = receipt
    .items
    .iter()
    .find(|i| i.product_id == PORTRAIT_SESSION_PRINTS)
    .unwrap();
  assert_eq!((prints.quantity, prints.price_cents), (2, 3500));
}

/// `round(subtotal * 1.1)` with halves rounded up, on integer cents.
fn expected_total(subtotal_cents: i64) -> i64 {
  (subtotal_cents * 11 + 5) / 10
}

#[tokio::test]
async fn order_totals_follow_the_cart_across_shapes() {
  setup_tracing();
  // (unit price, quantity) per line, and the total the customer is charged.
  let cases: &[(&[(i64, i64)], i64)] = &[
    (&[(1995, 1)], 2195),
    (&[(5, 1)], 6),
    (&[(15, 3)], 50),
    (&[(1995, 1), (5, 1)], 2200),
    (&[(1234, 2), (15, 1)], 2731),
    (&[(4500, 1), (3500, 2)], 12650),
    (&[(333, 7), (1, 1), (9999, 4)], 46561),
  ];

  for (lines, charged) in cases {
    let products: Vec<Product> = lines
      .iter()
      .enumerate()
      .map(|(i, (price, _))| {
        Product::new(Uuid::new_v4(), format!("Print {}", i), None, *price, None, "Prints", false).unwrap()
      })
      .collect();
    let store = Arc::new(MemoryStore::with_products(products.clone()));
    let session = session_for(&store, customer()).await;
    let cart = session.cart().unwrap();
    for (product, (_, quantity)) in products.iter().zip(lines.iter()) {
      cart.add_to_cart(product.id, *quantity).await.unwrap();
    }

    let receipt = orchestrator(&store).create_order(&session).await.unwrap();

    let subtotal: i64 = lines.iter().map(|(price, quantity)| price * quantity).sum();
    assert_eq!(receipt.order.total_amount_cents, *charged, "lines {:?}", lines);
    assert_eq!(receipt.order.total_amount_cents, expected_total(subtotal), "lines {:?}", lines);
    assert_eq!(receipt.items.len(), lines.len());
    assert_eq!(store.order_item_count(), lines.len());
  }
}

#[tokio::test]
async fn a_full_line_checks_out() {
  setup_tracing();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  let cart = session.cart().unwrap();
  cart.add_to_cart(WEDDING_ALBUM_LUXURY, MAX_LINE_QUANTITY).await.unwrap();
  let price = store.get_product(WEDDING_ALBUM_LUXURY).await.unwrap().unwrap().price_cents;

  let receipt = orchestrator(&store).create_order(&session).await.unwrap();

  assert_eq!(
    receipt.order.total_amount_cents,
    expected_total(price * MAX_LINE_QUANTITY)
  );
  assert_eq!(receipt.items[0].quantity, MAX_LINE_QUANTITY);
}

#[tokio::test]
async fn unpriceable_cart_is_refused_before_any_write() {
  setup_tracing();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  let cart = session.cart().unwrap();
  cart.add_to_cart(PREMIUM_PRINT_COLLECTION, 3).await.unwrap();
  // The catalog price changes after the line was added.
  assert!(store.set_price(PREMIUM_PRINT_COLLECTION, i64::MAX / 2));
  cart.refresh().await.unwrap();
  let writes = store.write_count();

  let err = orchestrator(&store).create_order(&session).await.unwrap_err();

  assert!(matches!(err, ShopError::Validation(_)));
  assert_eq!(store.write_count(), writes);
  assert_eq!(store.order_count(), 0);
  assert_eq!(cart.cart_count(), 3);
  assert!(!session.is_processing());
}

#[tokio::test]
async fn cart_is_cleared_after_checkout() {
  setup_tracing();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  let cart = session.cart().unwrap();
  cart.add_to_cart(DIGITAL_GALLERY, 1).await.unwrap();

  orchestrator(&store).create_order(&session).await.unwrap();

  assert_eq!(cart.cart_count(), 0);
  assert!(store.list_cart_items(cart.user_id()).await.unwrap().is_empty());
  assert!(!session.is_processing());
}

#[tokio::test]
async fn empty_cart_writes_nothing() {
  setup_tracing();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;

  let err = orchestrator(&store).create_order(&session).await.unwrap_err();

  assert!(matches!(err, ShopError::EmptyCart));
  assert_eq!(store.write_count(), 0);
  assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn anonymous_session_writes_nothing() {
  setup_tracing();
  let store = seeded_store();
  let session = ShopSession::anonymous();

  let err = orchestrator(&store).create_order(&session).await.unwrap_err();

  assert!(matches!(err, ShopError::Unauthenticated(_)));
  assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn order_insert_failure_is_generic_and_keeps_the_cart() {
  setup_tracing();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  session.cart().unwrap().add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();
  store.fail_on(StoreOp::InsertOrder);

  let err = orchestrator(&store).create_order(&session).await.unwrap_err();

  assert!(matches!(err, ShopError::CheckoutFailed { .. }));
  assert_eq!(err.to_string(), "Failed to process checkout. Please try again.");
  assert_eq!(store.order_count(), 0);
  assert_eq!(session.cart().unwrap().cart_count(), 1);
}

#[tokio::test]
async fn item_insert_failure_rolls_back_the_order() {
  setup_tracing();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  session.cart().unwrap().add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();
  store.fail_on(StoreOp::InsertOrderItems);

  let err = orchestrator(&store).create_order(&session).await.unwrap_err();

  assert!(matches!(err, ShopError::CheckoutFailed { .. }));
  assert_eq!(store.order_count(), 0);
  assert_eq!(session.cart().unwrap().cart_count(), 1);
}

#[tokio::test]
async fn item_insert_failure_leaves_orphan_when_rollback_disabled() {
  setup_tracing();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  session.cart().unwrap().add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();
  store.fail_on(StoreOp::InsertOrderItems);
  let config = CheckoutConfig {
    rollback_orphaned_orders: false,
    ..CheckoutConfig::default()
  };

  let err = orchestrator_with(&store, config, Arc::new(PendingGateway))
    .create_order(&session)
    .await
    .unwrap_err();

  assert!(matches!(err, ShopError::CheckoutFailed { .. }));
  assert_eq!(store.order_count(), 1);
  assert_eq!(store.order_item_count(), 0);
}

#[tokio::test]
async fn double_submit_is_rejected_while_in_flight() {
  setup_tracing();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  session.cart().unwrap().add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();
  let config = CheckoutConfig {
    payment_hold: Duration::from_millis(50),
    ..CheckoutConfig::default()
  };
  let checkout = orchestrator_with(&store, config, Arc::new(PendingGateway));

  let (first, second) = tokio::join!(checkout.create_order(&session), checkout.create_order(&session));

  assert!(first.is_ok());
  assert!(matches!(second, Err(ShopError::CheckoutInProgress)));
  assert_eq!(store.order_count(), 1);
  assert!(!session.is_processing());
}

#[tokio::test]
async fn pending_gateway_refuses_payment() {
  setup_tracing();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  session.cart().unwrap().add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();
  let checkout = orchestrator(&store);
  let receipt = checkout.create_order(&session).await.unwrap();

  let err = checkout.process_payment(receipt.order.id).await.unwrap_err();

  assert!(matches!(err, ShopError::PaymentUnavailable { order_id, .. } if order_id == receipt.order.id));
  let order = store.get_order(receipt.order.id).await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
#[serial]
async fn gateway_outcome_is_recorded_on_the_order() {
  setup_tracing();
  reset_gateway_captures();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  let cart = session.cart().unwrap();
  let checkout = orchestrator_with(&store, CheckoutConfig::default(), Arc::new(RecordingGateway { approve: true }));

  cart.add_to_cart(PREMIUM_PRINT_COLLECTION, 1).await.unwrap();
  let paid = checkout.create_order(&session).await.unwrap();
  let outcome = checkout.process_payment(paid.order.id).await.unwrap();
  assert!(matches!(outcome, PaymentOutcome::Paid { .. }));
  assert_eq!(store.get_order(paid.order.id).await.unwrap().unwrap().status, OrderStatus::Paid);

  let err = checkout.process_payment(paid.order.id).await.unwrap_err();
  assert!(matches!(err, ShopError::Validation(_)));
  assert_eq!(gateway_captures(), 1);
}

#[tokio::test]
#[serial]
async fn declined_payment_marks_order_failed() {
  setup_tracing();
  reset_gateway_captures();
  let store = seeded_store();
  let session = session_for(&store, customer()).await;
  let checkout = orchestrator_with(&store, CheckoutConfig::default(), Arc::new(RecordingGateway { approve: false }));

  session.cart().unwrap().add_to_cart(DIGITAL_GALLERY, 1).await.unwrap();
  let receipt = checkout.create_order(&session).await.unwrap();
  let outcome = checkout.process_payment(receipt.order.id).await.unwrap();

  assert!(matches!(outcome, PaymentOutcome::Declined { .. }));
  assert_eq!(store.get_order(receipt.order.id).await.unwrap().unwrap().status, OrderStatus::Failed);
  assert_eq!(gateway_captures(), 1);
}

#[tokio::test]
async fn payment_for_unknown_order_is_not_found() {
  setup_tracing();
  let store = seeded_store();
  let err = orchestrator(&store).process_payment(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, ShopError::NotFound { entity: "Order", .. }));
}
