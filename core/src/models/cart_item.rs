// darkroom/src/models/cart_item.rs

use crate::error::{ShopError, ShopResult};
use crate::models::Product;
use crate::pricing::{self, MAX_LINE_QUANTITY};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The product fields a cart line displays and prices with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
  pub name: String,
  pub price_cents: i64,
  pub image_url: Option<String>,
}

impl From<&Product> for ProductSnapshot {
  fn from(product: &Product) -> Self {
    Self {
      name: product.name.clone(),
      price_cents: product.price_cents,
      image_url: product.image_url.clone(),
    }
  }
}

/// One cart line. Unique per (user, product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i64,
  pub product: ProductSnapshot,
}

impl CartItem {
  pub fn new(
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    product: ProductSnapshot,
  ) -> ShopResult<Self> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
      return Err(ShopError::Validation(format!(
        "Cart line for product {} has quantity {}; it must be between 1 and {}.",
        product_id, quantity, MAX_LINE_QUANTITY
      )));
    }
    if product.price_cents < 0 {
      return Err(ShopError::Validation(format!(
        "Cart line for product {} has a negative price.",
        product_id
      )));
    }
    Ok(Self {
      id,
      user_id,
      product_id,
      quantity,
      product,
    })
  }

  pub fn line_total_cents(&self) -> ShopResult<i64> {
    pricing::line_total(self.product.price_cents, self.quantity)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn snapshot(price_cents: i64) -> ProductSnapshot {
    ProductSnapshot {
      name: "Canvas Print Set".to_string(),
      price_cents,
      image_url: None,
    }
  }

  #[test]
  fn quantity_must_stay_within_line_bounds() {
    let line = |quantity| CartItem::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), quantity, snapshot(18000));
    assert!(line(1).is_ok());
    assert!(line(MAX_LINE_QUANTITY).is_ok());
    assert!(matches!(line(0), Err(ShopError::Validation(_))));
    assert!(matches!(line(MAX_LINE_QUANTITY + 1), Err(ShopError::Validation(_))));
    assert!(matches!(line(1_000_000_000_000_000), Err(ShopError::Validation(_))));
  }

  #[test]
  fn line_total_reports_overflow() {
    let item = CartItem::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 2, snapshot(i64::MAX / 2 + 1)).unwrap();
    assert!(matches!(item.line_total_cents(), Err(ShopError::Validation(_))));
  }
}
