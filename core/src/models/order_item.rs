// darkroom/src/models/order_item.rs

use crate::error::{ShopError, ShopResult};
use crate::models::ProductSnapshot;
use crate::pricing::{self, MAX_LINE_QUANTITY};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Insert payload for `order_items`. `price_cents` is the unit price at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderItem {
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i64,
  pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i64,
  pub price_cents: i64,
}

impl OrderItem {
  pub fn new(id: Uuid, order_id: Uuid, product_id: Uuid, quantity: i64, price_cents: i64) -> ShopResult<Self> {
    validate_line(product_id, quantity, price_cents)?;
    Ok(Self {
      id,
      order_id,
      product_id,
      quantity,
      price_cents,
    })
  }
}

/// An order item joined with its product, as shown on the review page.
///
/// `product` is `None` when the product row has since disappeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
  pub product_id: Uuid,
  pub quantity: i64,
  pub price_cents: i64,
  pub product: Option<ProductSnapshot>,
}

impl OrderLine {
  pub fn new(product_id: Uuid, quantity: i64, price_cents: i64, product: Option<ProductSnapshot>) -> ShopResult<Self> {
    validate_line(product_id, quantity, price_cents)?;
    Ok(Self {
      product_id,
      quantity,
      price_cents,
      product,
    })
  }

  pub fn display_name(&self) -> &str {
    self.product.as_ref().map(|p| p.name.as_str()).unwrap_or("Item")
  }

  pub fn line_total_cents(&self) -> ShopResult<i64> {
    pricing::line_total(self.price_cents, self.quantity)
  }
}

fn validate_line(product_id: Uuid, quantity: i64, price_cents: i64) -> ShopResult<()> {
  if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
    return Err(ShopError::Validation(format!(
      "Order line for product {} has quantity {}.",
      product_id, quantity
    )));
  }
  if price_cents < 0 {
    return Err(ShopError::Validation(format!(
      "Order line for product {} has a negative price.",
      product_id
    )));
  }
  Ok(())
}
