// darkroom_server/src/db/rows.rs

//! Raw rows as postgres returns them. Each converts into its validated shop record; a row
//! that does not form one is reported as `StoreError::InvalidRow`.

use chrono::{DateTime, Utc};
use darkroom::models::{CartItem, Order, OrderItem, OrderLine, OrderStatus, Product, ProductSnapshot};
use darkroom::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub image_url: Option<String>,
  pub category: String,
  pub is_digital: bool,
}

impl TryFrom<ProductRow> for Product {
  type Error = StoreError;

  fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
    Product::new(
      row.id,
      row.name,
      row.description,
      row.price_cents,
      row.image_url,
      row.category,
      row.is_digital,
    )
    .map_err(|e| StoreError::invalid_row("products", e.to_string()))
  }
}

/// A `cart_items` row joined with its product.
#[derive(Debug, Clone, FromRow)]
pub struct CartItemRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i64,
  pub product_name: String,
  pub product_price_cents: i64,
  pub product_image_url: Option<String>,
}

impl TryFrom<CartItemRow> for CartItem {
  type Error = StoreError;

  fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
    let product = ProductSnapshot {
      name: row.product_name,
      price_cents: row.product_price_cents,
      image_url: row.product_image_url,
    };
    CartItem::new(row.id, row.user_id, row.product_id, row.quantity, product)
      .map_err(|e| StoreError::invalid_row("cart_items", e.to_string()))
  }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub total_amount_cents: i64,
  pub status: String,
  pub currency: String,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let status: OrderStatus = row
      .status
      .parse()
      .map_err(|e: darkroom::ShopError| StoreError::invalid_row("orders", e.to_string()))?;
    Order::new(
      row.id,
      row.user_id,
      row.total_amount_cents,
      status,
      row.currency,
      row.created_at,
    )
    .map_err(|e| StoreError::invalid_row("orders", e.to_string()))
  }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i64,
  pub price_cents: i64,
}

impl TryFrom<OrderItemRow> for OrderItem {
  type Error = StoreError;

  fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
    OrderItem::new(row.id, row.order_id, row.product_id, row.quantity, row.price_cents)
      .map_err(|e| StoreError::invalid_row("order_items", e.to_string()))
  }
}

/// An `order_items` row left-joined with its product; the product columns are null when the
/// product has since been removed from the catalog.
#[derive(Debug, Clone, FromRow)]
pub struct OrderLineRow {
  pub product_id: Uuid,
  pub quantity: i64,
  pub price_cents: i64,
  pub product_name: Option<String>,
  pub product_price_cents: Option<i64>,
  pub product_image_url: Option<String>,
}

impl TryFrom<OrderLineRow> for OrderLine {
  type Error = StoreError;

  fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
    let product = match (row.product_name, row.product_price_cents) {
      (Some(name), Some(price_cents)) => Some(ProductSnapshot {
        name,
        price_cents,
        image_url: row.product_image_url,
      }),
      _ => None,
    };
    OrderLine::new(row.product_id, row.quantity, row.price_cents, product)
      .map_err(|e| StoreError::invalid_row("order_items", e.to_string()))
  }
}
