// darkroom/src/review.rs

//! Order Review: reloads a persisted order with its lines and re-derives the totals shown
//! next to the (currently disabled) payment action.
//!
//! The displayed summary is recomputed from the item rows. The stored `total_amount_cents`
//! stays the amount a gateway would capture; a divergence between the two is surfaced via
//! [`OrderReview::total_matches_stored`] and logged.

use crate::error::{ShopError, ShopResult};
use crate::models::{Order, OrderLine};
use crate::payment::{PaymentAction, PaymentGateway};
use crate::pricing::OrderSummary;
use crate::store::ShopStore;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct OrderReview {
  pub order: Order,
  pub reference: String,
  pub lines: Vec<OrderLine>,
  pub summary: OrderSummary,
  pub stored_total_cents: i64,
  pub payment: PaymentAction,
}

impl OrderReview {
  pub fn total_matches_stored(&self) -> bool {
    self.summary.total_cents == self.stored_total_cents
  }
}

/// Result of a review lookup that reached the store.
#[derive(Debug, Clone)]
pub enum ReviewState {
  Found(OrderReview),
  /// No such order, or not one the viewer may see.
  NotFound,
}

/// Parses a raw path segment. Anything that is not an order id cannot name an order.
pub fn parse_order_id(raw: &str) -> Option<Uuid> {
  Uuid::parse_str(raw.trim()).ok()
}

/// Loads the review for `order_id`.
///
/// When `viewer` is given, orders belonging to someone else are reported as not found.
/// Store failures are errors, distinct from [`ReviewState::NotFound`].
#[instrument(name = "review::load_review", skip(store, gateway))]
pub async fn load_review(
  store: &dyn ShopStore,
  gateway: &dyn PaymentGateway,
  order_id: Uuid,
  viewer: Option<Uuid>,
) -> ShopResult<ReviewState> {
  let order = match store.get_order(order_id).await {
    Ok(Some(order)) => order,
    Ok(None) => {
      info!("Order not found.");
      return Ok(ReviewState::NotFound);
    }
    Err(e) => {
      error!(error = %e, "Failed to load order.");
      return Err(ShopError::Store(e));
    }
  };

  if let Some(viewer) = viewer {
    if viewer != order.user_id {
      warn!(%viewer, "Order requested by a user who does not own it.");
      return Ok(ReviewState::NotFound);
    }
  }

  let lines = store.list_order_lines(order_id).await.map_err(|e| {
    error!(error = %e, "Failed to load order items.");
    ShopError::Store(e)
  })?;

  let summary = OrderSummary::for_lines(&lines).map_err(|e| {
    error!(error = %e, "Order lines do not add up to a representable total.");
    e
  })?;
  let review = OrderReview {
    reference: order.reference(),
    stored_total_cents: order.total_amount_cents,
    payment: PaymentAction::for_gateway(gateway),
    summary,
    lines,
    order,
  };
  if !review.total_matches_stored() {
    warn!(
      recomputed_cents = review.summary.total_cents,
      stored_cents = review.stored_total_cents,
      "Recomputed order total differs from the stored total."
    );
  }
  Ok(ReviewState::Found(review))
}
