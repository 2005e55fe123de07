// darkroom/src/store/mod.rs

//! The table-store seam: everything the shop reads from or writes to the hosted tables
//! (`products`, `cart_items`, `orders`, `order_items`).

pub mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::{CartItem, NewOrder, NewOrderItem, Order, OrderItem, OrderLine, OrderStatus, Product};
use async_trait::async_trait;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Names of the store operations, used for logging and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
  ListProducts,
  GetProduct,
  ListCartItems,
  UpsertCartItem,
  DeleteCartItem,
  ClearCart,
  InsertOrder,
  GetOrder,
  UpdateOrderStatus,
  DeleteOrder,
  InsertOrderItems,
  ListOrderLines,
}

impl StoreOp {
  pub fn as_str(&self) -> &'static str {
    match self {
      StoreOp::ListProducts => "list_products",
      StoreOp::GetProduct => "get_product",
      StoreOp::ListCartItems => "list_cart_items",
      StoreOp::UpsertCartItem => "upsert_cart_item",
      StoreOp::DeleteCartItem => "delete_cart_item",
      StoreOp::ClearCart => "clear_cart",
      StoreOp::InsertOrder => "insert_order",
      StoreOp::GetOrder => "get_order",
      StoreOp::UpdateOrderStatus => "update_order_status",
      StoreOp::DeleteOrder => "delete_order",
      StoreOp::InsertOrderItems => "insert_order_items",
      StoreOp::ListOrderLines => "list_order_lines",
    }
  }
}

#[async_trait]
pub trait ShopStore: Send + Sync {
  /// Products ordered by name; `category` narrows to one category.
  async fn list_products(&self, category: Option<&str>) -> StoreResult<Vec<Product>>;

  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>>;

  /// The user's cart lines joined with their products, oldest first.
  async fn list_cart_items(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>>;

  /// Sets the quantity of the (user, product) line, creating the line if needed.
  async fn upsert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i64) -> StoreResult<CartItem>;

  /// Returns whether a line was deleted.
  async fn delete_cart_item(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool>;

  async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()>;

  async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;

  async fn get_order(&self, order_id: Uuid) -> StoreResult<Option<Order>>;

  /// Returns `None` when the order does not exist.
  async fn update_order_status(&self, order_id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>>;

  /// Removes an order and any items already written for it.
  async fn delete_order(&self, order_id: Uuid) -> StoreResult<()>;

  /// Inserts all items as one batch: either every row is written or none is.
  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> StoreResult<Vec<OrderItem>>;

  /// Items of an order joined with product name, price and image.
  async fn list_order_lines(&self, order_id: Uuid) -> StoreResult<Vec<OrderLine>>;
}
