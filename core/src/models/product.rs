// darkroom/src/models/product.rs

use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub image_url: Option<String>,
  pub category: String,
  pub is_digital: bool,
}

impl Product {
  pub fn new(
    id: Uuid,
    name: impl Into<String>,
    description: Option<String>,
    price_cents: i64,
    image_url: Option<String>,
    category: impl Into<String>,
    is_digital: bool,
  ) -> ShopResult<Self> {
    let name = name.into();
    if name.trim().is_empty() {
      return Err(ShopError::Validation(format!("Product {} has an empty name.", id)));
    }
    if price_cents < 0 {
      return Err(ShopError::Validation(format!(
        "Product {} has a negative price ({}).",
        id, price_cents
      )));
    }
    Ok(Self {
      id,
      name,
      description,
      price_cents,
      image_url,
      category: category.into(),
      is_digital,
    })
  }
}
