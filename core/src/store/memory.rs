// darkroom/src/store/memory.rs

//! In-process table store used by tests, benches and the `memory` server backend.

use crate::catalog;
use crate::error::StoreError;
use crate::models::{
  CartItem, NewOrder, NewOrderItem, Order, OrderItem, OrderLine, OrderStatus, Product, ProductSnapshot,
};
use crate::pricing;
use crate::store::{ShopStore, StoreOp, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct CartRow {
  id: Uuid,
  user_id: Uuid,
  product_id: Uuid,
  quantity: i64,
}

#[derive(Debug, Default)]
struct Tables {
  products: Vec<Product>,
  cart_items: Vec<CartRow>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
}

impl Tables {
  fn product(&self, product_id: Uuid) -> Option<&Product> {
    self.products.iter().find(|p| p.id == product_id)
  }

  fn join_cart_row(&self, row: &CartRow) -> StoreResult<CartItem> {
    let product = self
      .product(row.product_id)
      .ok_or_else(|| StoreError::invalid_row("cart_items", format!("product {} does not exist", row.product_id)))?;
    CartItem::new(row.id, row.user_id, row.product_id, row.quantity, ProductSnapshot::from(product))
      .map_err(|e| StoreError::invalid_row("cart_items", e.to_string()))
  }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
  failing: Mutex<HashSet<StoreOp>>,
  writes: AtomicUsize,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// A store holding the studio catalog.
  pub fn seeded() -> Self {
    let store = Self::new();
    store.tables.write().products = catalog::seed_products();
    store
  }

  pub fn with_products(products: Vec<Product>) -> Self {
    let store = Self::new();
    store.tables.write().products = products;
    store
  }

  /// Makes every later call of `op` fail with a backend error until [`recover`](Self::recover).
  pub fn fail_on(&self, op: StoreOp) {
    self.failing.lock().insert(op);
  }

  pub fn recover(&self, op: StoreOp) {
    self.failing.lock().remove(&op);
  }

  /// Number of successful writes (inserts, updates, deletes) so far.
  pub fn write_count(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }

  pub fn order_count(&self) -> usize {
    self.tables.read().orders.len()
  }

  pub fn order_item_count(&self) -> usize {
    self.tables.read().order_items.len()
  }

  /// Overwrites a product's price, e.g. to simulate a catalog change after checkout.
  pub fn set_price(&self, product_id: Uuid, price_cents: i64) -> bool {
    let mut tables = self.tables.write();
    match tables.products.iter_mut().find(|p| p.id == product_id) {
      Some(product) => {
        product.price_cents = price_cents;
        true
      }
      None => false,
    }
  }

  /// Rewrites an order's stored total, e.g. to simulate an edit made outside the shop.
  pub fn overwrite_order_total(&self, order_id: Uuid, total_amount_cents: i64) -> bool {
    let mut tables = self.tables.write();
    match tables.orders.iter_mut().find(|o| o.id == order_id) {
      Some(order) => {
        order.total_amount_cents = total_amount_cents;
        true
      }
      None => false,
    }
  }

  fn check(&self, op: StoreOp) -> StoreResult<()> {
    if self.failing.lock().contains(&op) {
      warn!(operation = op.as_str(), "Injected table store failure.");
      return Err(StoreError::backend(
        op.as_str(),
        anyhow::anyhow!("injected failure for {}", op.as_str()),
      ));
    }
    Ok(())
  }

  fn wrote(&self) {
    self.writes.fetch_add(1, Ordering::SeqCst);
  }
}

#[async_trait]
impl ShopStore for MemoryStore {
  async fn list_products(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
    self.check(StoreOp::ListProducts)?;
    let tables = self.tables.read();
    let mut products: Vec<Product> = tables
      .products
      .iter()
      .filter(|p| category.map_or(true, |c| p.category == c))
      .cloned()
      .collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(products)
  }

  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
    self.check(StoreOp::GetProduct)?;
    Ok(self.tables.read().product(product_id).cloned())
  }

  async fn list_cart_items(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>> {
    self.check(StoreOp::ListCartItems)?;
    let tables = self.tables.read();
    tables
      .cart_items
      .iter()
      .filter(|row| row.user_id == user_id)
      .map(|row| tables.join_cart_row(row))
      .collect()
  }

  #[instrument(name = "memory_store::upsert_cart_item", skip(self))]
  async fn upsert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i64) -> StoreResult<CartItem> {
    self.check(StoreOp::UpsertCartItem)?;
    pricing::check_quantity(quantity).map_err(|e| StoreError::invalid_row("cart_items", e.to_string()))?;
    let mut tables = self.tables.write();
    if tables.product(product_id).is_none() {
      return Err(StoreError::MissingReference(format!("product {}", product_id)));
    }
    let position = tables
      .cart_items
      .iter()
      .position(|row| row.user_id == user_id && row.product_id == product_id);
    let row = match position {
      Some(idx) => {
        tables.cart_items[idx].quantity = quantity;
        tables.cart_items[idx].clone()
      }
      None => {
        let row = CartRow {
          id: Uuid::new_v4(),
          user_id,
          product_id,
          quantity,
        };
        tables.cart_items.push(row.clone());
        row
      }
    };
    let item = tables.join_cart_row(&row)?;
    self.wrote();
    debug!(cart_item_id = %item.id, "Cart line written.");
    Ok(item)
  }

  async fn delete_cart_item(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool> {
    self.check(StoreOp::DeleteCartItem)?;
    let mut tables = self.tables.write();
    let before = tables.cart_items.len();
    tables
      .cart_items
      .retain(|row| !(row.user_id == user_id && row.product_id == product_id));
    let deleted = tables.cart_items.len() != before;
    if deleted {
      self.wrote();
    }
    Ok(deleted)
  }

  async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()> {
    self.check(StoreOp::ClearCart)?;
    self.tables.write().cart_items.retain(|row| row.user_id != user_id);
    self.wrote();
    Ok(())
  }

  #[instrument(name = "memory_store::insert_order", skip(self, order), fields(user_id = %order.user_id))]
  async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
    self.check(StoreOp::InsertOrder)?;
    let order = Order::new(
      Uuid::new_v4(),
      order.user_id,
      order.total_amount_cents,
      order.status,
      order.currency,
      Utc::now(),
    )
    .map_err(|e| StoreError::invalid_row("orders", e.to_string()))?;
    self.tables.write().orders.push(order.clone());
    self.wrote();
    Ok(order)
  }

  async fn get_order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
    self.check(StoreOp::GetOrder)?;
    Ok(self.tables.read().orders.iter().find(|o| o.id == order_id).cloned())
  }

  async fn update_order_status(&self, order_id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>> {
    self.check(StoreOp::UpdateOrderStatus)?;
    let mut tables = self.tables.write();
    let Some(order) = tables.orders.iter_mut().find(|o| o.id == order_id) else {
      return Ok(None);
    };
    order.status = status;
    let updated = order.clone();
    self.wrote();
    Ok(Some(updated))
  }

  async fn delete_order(&self, order_id: Uuid) -> StoreResult<()> {
    self.check(StoreOp::DeleteOrder)?;
    let mut tables = self.tables.write();
    tables.order_items.retain(|item| item.order_id != order_id);
    tables.orders.retain(|o| o.id != order_id);
    self.wrote();
    Ok(())
  }

  #[instrument(name = "memory_store::insert_order_items", skip(self, items), fields(count = items.len()))]
  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> StoreResult<Vec<OrderItem>> {
    self.check(StoreOp::InsertOrderItems)?;
    let mut tables = self.tables.write();
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
      if !tables.orders.iter().any(|o| o.id == item.order_id) {
        return Err(StoreError::MissingReference(format!("order {}", item.order_id)));
      }
      if tables.product(item.product_id).is_none() {
        return Err(StoreError::MissingReference(format!("product {}", item.product_id)));
      }
      let row = OrderItem::new(Uuid::new_v4(), item.order_id, item.product_id, item.quantity, item.price_cents)
        .map_err(|e| StoreError::invalid_row("order_items", e.to_string()))?;
      rows.push(row);
    }
    tables.order_items.extend(rows.iter().cloned());
    self.wrote();
    Ok(rows)
  }

  async fn list_order_lines(&self, order_id: Uuid) -> StoreResult<Vec<OrderLine>> {
    self.check(StoreOp::ListOrderLines)?;
    let tables = self.tables.read();
    tables
      .order_items
      .iter()
      .filter(|item| item.order_id == order_id)
      .map(|item| {
        let product = tables.product(item.product_id).map(ProductSnapshot::from);
        OrderLine::new(item.product_id, item.quantity, item.price_cents, product)
          .map_err(|e| StoreError::invalid_row("order_items", e.to_string()))
      })
      .collect()
  }
}
