// darkroom/src/models/order.rs

use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of an order. Checkout only ever writes `Pending`; the other states belong to
/// the payment gateway once one is integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Failed,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Paid => "paid",
      OrderStatus::Failed => "failed",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = ShopError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "paid" => Ok(OrderStatus::Paid),
      "failed" => Ok(OrderStatus::Failed),
      "cancelled" => Ok(OrderStatus::Cancelled),
      other => Err(ShopError::Validation(format!("Unknown order status '{}'.", other))),
    }
  }
}

/// Insert payload for the `orders` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
  pub user_id: Uuid,
  /// Tax-inclusive.
  pub total_amount_cents: i64,
  pub status: OrderStatus,
  pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub total_amount_cents: i64,
  pub status: OrderStatus,
  pub currency: String,
  pub created_at: DateTime<Utc>,
}

impl Order {
  pub fn new(
    id: Uuid,
    user_id: Uuid,
    total_amount_cents: i64,
    status: OrderStatus,
    currency: impl Into<String>,
    created_at: DateTime<Utc>,
  ) -> ShopResult<Self> {
    if total_amount_cents < 0 {
      return Err(ShopError::Validation(format!(
        "Order {} has a negative total ({}).",
        id, total_amount_cents
      )));
    }
    let currency = currency.into();
    if currency.trim().is_empty() {
      return Err(ShopError::Validation(format!("Order {} has no currency.", id)));
    }
    Ok(Self {
      id,
      user_id,
      total_amount_cents,
      status,
      currency,
      created_at,
    })
  }

  /// Short reference shown to customers, e.g. `#1f0c2a9b`.
  pub fn reference(&self) -> String {
    let id = self.id.simple().to_string();
    format!("#{}", &id[..8])
  }
}
