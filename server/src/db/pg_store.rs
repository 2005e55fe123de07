// darkroom_server/src/db/pg_store.rs

use super::rows::{CartItemRow, OrderItemRow, OrderLineRow, OrderRow, ProductRow};
use async_trait::async_trait;
use darkroom::models::{CartItem, NewOrder, NewOrderItem, Order, OrderItem, OrderLine, OrderStatus, Product};
use darkroom::store::StoreResult;
use darkroom::{ShopStore, StoreError, StoreOp};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, image_url, category, is_digital";
const ORDER_COLUMNS: &str = "id, user_id, total_amount_cents, status, currency, created_at";

/// Table store over the postgres schema in `migrations/`.
#[derive(Debug, Clone)]
pub struct PgShopStore {
  pool: PgPool,
}

impl PgShopStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

/// Maps a driver error onto the store taxonomy. Foreign-key violations name a missing row.
fn store_error(op: StoreOp) -> impl FnOnce(sqlx::Error) -> StoreError {
  move |err| {
    if let sqlx::Error::Database(db_err) = &err {
      if db_err.is_foreign_key_violation() {
        return StoreError::MissingReference(db_err.message().to_string());
      }
    }
    StoreError::backend(op.as_str(), err)
  }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
  T: TryFrom<R, Error = StoreError>,
{
  rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl ShopStore for PgShopStore {
  #[instrument(name = "pg_store::list_products", skip(self))]
  async fn list_products(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(&format!(
      "SELECT {} FROM products WHERE ($1::TEXT IS NULL OR category = $1) ORDER BY name ASC",
      PRODUCT_COLUMNS
    ))
    .bind(category)
    .fetch_all(&self.pool)
    .await
    .map_err(store_error(StoreOp::ListProducts))?;
    convert_all(rows)
  }

  #[instrument(name = "pg_store::get_product", skip(self))]
  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(product_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error(StoreOp::GetProduct))?;
    row.map(Product::try_from).transpose()
  }

  #[instrument(name = "pg_store::list_cart_items", skip(self))]
  async fn list_cart_items(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>> {
    let rows: Vec<CartItemRow> = sqlx::query_as(
      r#"
      SELECT ci.id, ci.user_id, ci.product_id, ci.quantity,
             p.name AS product_name, p.price_cents AS product_price_cents, p.image_url AS product_image_url
      FROM cart_items ci
      JOIN products p ON p.id = ci.product_id
      WHERE ci.user_id = $1
      ORDER BY ci.added_at ASC, ci.id ASC
      "#,
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(store_error(StoreOp::ListCartItems))?;
    convert_all(rows)
  }

  #[instrument(name = "pg_store::upsert_cart_item", skip(self))]
  async fn upsert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i64) -> StoreResult<CartItem> {
    let row: CartItemRow = sqlx::query_as(
      r#"
      WITH upserted AS (
        INSERT INTO cart_items (id, user_id, product_id, quantity, added_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
        RETURNING id, user_id, product_id, quantity
      )
      SELECT u.id, u.user_id, u.product_id, u.quantity,
             p.name AS product_name, p.price_cents AS product_price_cents, p.image_url AS product_image_url
      FROM upserted u
      JOIN products p ON p.id = u.product_id
      "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&self.pool)
    .await
    .map_err(store_error(StoreOp::UpsertCartItem))?;
    let item = CartItem::try_from(row)?;
    debug!(cart_item_id = %item.id, "Cart line written.");
    Ok(item)
  }

  #[instrument(name = "pg_store::delete_cart_item", skip(self))]
  async fn delete_cart_item(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .execute(&self.pool)
      .await
      .map_err(store_error(StoreOp::DeleteCartItem))?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "pg_store::clear_cart", skip(self))]
  async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await
      .map_err(store_error(StoreOp::ClearCart))?;
    debug!(removed = result.rows_affected(), "Cart cleared.");
    Ok(())
  }

  #[instrument(name = "pg_store::insert_order", skip(self, order), fields(user_id = %order.user_id))]
  async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
    let row: OrderRow = sqlx::query_as(&format!(
      "INSERT INTO orders (id, user_id, total_amount_cents, status, currency, created_at) \
       VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(order.user_id)
    .bind(order.total_amount_cents)
    .bind(order.status.as_str())
    .bind(&order.currency)
    .fetch_one(&self.pool)
    .await
    .map_err(store_error(StoreOp::InsertOrder))?;
    Order::try_from(row)
  }

  #[instrument(name = "pg_store::get_order", skip(self))]
  async fn get_order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error(StoreOp::GetOrder))?;
    row.map(Order::try_from).transpose()
  }

  #[instrument(name = "pg_store::update_order_status", skip(self))]
  async fn update_order_status(&self, order_id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(status.as_str())
    .fetch_optional(&self.pool)
    .await
    .map_err(store_error(StoreOp::UpdateOrderStatus))?;
    row.map(Order::try_from).transpose()
  }

  #[instrument(name = "pg_store::delete_order", skip(self))]
  async fn delete_order(&self, order_id: Uuid) -> StoreResult<()> {
    // order_items rows go with it (ON DELETE CASCADE).
    sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(order_id)
      .execute(&self.pool)
      .await
      .map_err(store_error(StoreOp::DeleteOrder))?;
    Ok(())
  }

  #[instrument(name = "pg_store::insert_order_items", skip(self, items), fields(count = items.len()))]
  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> StoreResult<Vec<OrderItem>> {
    let mut tx = self
      .pool
      .begin()
      .await
      .map_err(store_error(StoreOp::InsertOrderItems))?;

    let mut rows = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
      let row: OrderItemRow = sqlx::query_as(
        "INSERT INTO order_items (id, order_id, position, product_id, quantity, price_cents) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id, order_id, product_id, quantity, price_cents",
      )
      .bind(Uuid::new_v4())
      .bind(item.order_id)
      .bind(position as i32)
      .bind(item.product_id)
      .bind(item.quantity)
      .bind(item.price_cents)
      .fetch_one(&mut *tx)
      .await
      .map_err(store_error(StoreOp::InsertOrderItems))?;
      rows.push(row);
    }

    tx.commit().await.map_err(store_error(StoreOp::InsertOrderItems))?;
    convert_all(rows)
  }

  #[instrument(name = "pg_store::list_order_lines", skip(self))]
  async fn list_order_lines(&self, order_id: Uuid) -> StoreResult<Vec<OrderLine>> {
    let rows: Vec<OrderLineRow> = sqlx::query_as(
      r#"
      SELECT oi.product_id, oi.quantity, oi.price_cents,
             p.name AS product_name, p.price_cents AS product_price_cents, p.image_url AS product_image_url
      FROM order_items oi
      LEFT JOIN products p ON p.id = oi.product_id
      WHERE oi.order_id = $1
      ORDER BY oi.position ASC
      "#,
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(store_error(StoreOp::ListOrderLines))?;
    convert_all(rows)
  }
}
