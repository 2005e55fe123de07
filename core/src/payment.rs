// darkroom/src/payment.rs

//! Payment gateway seam. No real gateway is integrated; [`PendingGateway`] stands in and
//! refuses every capture.

use crate::error::{ShopError, ShopResult};
use crate::models::Order;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
  Paid { gateway_reference: String },
  Declined { reason: String },
}

/// Accepts a pending order and eventually settles it.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn name(&self) -> &'static str;

  /// Whether the storefront may offer a "Pay Now" action at all.
  fn accepts_payments(&self) -> bool;

  async fn capture(&self, order: &Order) -> ShopResult<PaymentOutcome>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PendingGateway;

#[async_trait]
impl PaymentGateway for PendingGateway {
  fn name(&self) -> &'static str {
    "pending"
  }

  fn accepts_payments(&self) -> bool {
    false
  }

  #[instrument(name = "pending_gateway::capture", skip(self, order), fields(order_id = %order.id))]
  async fn capture(&self, order: &Order) -> ShopResult<PaymentOutcome> {
    info!("Payment requested but no gateway is connected.");
    Err(ShopError::PaymentUnavailable {
      order_id: order.id,
      reason: "Connect Stripe to enable payment".to_string(),
    })
  }
}

/// The call-to-action shown next to an order summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentAction {
  pub enabled: bool,
  pub label: String,
  pub hint: Option<String>,
}

impl PaymentAction {
  pub fn for_gateway(gateway: &dyn PaymentGateway) -> Self {
    if gateway.accepts_payments() {
      Self {
        enabled: true,
        label: "Pay Now".to_string(),
        hint: None,
      }
    } else {
      Self {
        enabled: false,
        label: "Pay Now (Stripe coming soon)".to_string(),
        hint: Some("Connect Stripe to enable payment".to_string()),
      }
    }
  }
}
