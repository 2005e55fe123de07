// darkroom/src/checkout.rs

//! The Checkout Orchestrator: turns a session's cart into a pending order and its items,
//! clears the cart and points the customer at the order review page.
//!
//! The flow is a named-step [`Pipeline`]:
//!
//! 1. `require_identity`: a signed-in identity must exist.
//! 2. `require_items`: the cart must hold at least one line.
//! 3. `insert_order`: one `orders` row, `total = round(cart_total * 1.1)`, status `pending`.
//! 4. `insert_order_items`: one `order_items` row per cart line, priced at the snapshot unit price.
//! 5. `hold_for_payment` (optional): waits the configured hold, skipped when it is zero.
//! 6. `clear_cart`
//! 7. `resolve_redirect`: `/checkout/{order_id}`.
//!
//! Steps 1 and 2 fail before anything is written. A failure in step 3 or 4 is reported as the
//! generic [`ShopError::CheckoutFailed`]. Nothing is retried.

use crate::cart::CartStore;
use crate::error::{PipelineError, ShopError, ShopResult};
use crate::models::{CartItem, Identity, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus};
use crate::payment::{PaymentGateway, PaymentOutcome};
use crate::pipeline::{Pipeline, PipelineControl, PipelineResult, StepContext};
use crate::pricing;
use crate::session::ShopSession;
use crate::store::ShopStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

const PIPELINE_NAME: &str = "checkout";

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
  /// Currency code written on every order.
  pub currency: String,
  /// Pause between writing the order and clearing the cart. Zero disables the step.
  pub payment_hold: Duration,
  /// Delete the order row when its items could not be written.
  pub rollback_orphaned_orders: bool,
}

impl Default for CheckoutConfig {
  fn default() -> Self {
    Self {
      currency: "usd".to_string(),
      payment_hold: Duration::ZERO,
      rollback_orphaned_orders: true,
    }
  }
}

/// What a successful checkout hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
  pub order: Order,
  pub items: Vec<OrderItem>,
  /// Where the customer goes next: the review page of the new order.
  pub redirect: String,
}

/// Context data of one checkout run.
pub struct CheckoutCtxData {
  pub store: Arc<dyn ShopStore>,
  pub config: CheckoutConfig,
  pub identity: Option<Identity>,
  pub cart: Option<CartStore>,
  pub lines: Vec<CartItem>,
  pub order: Option<Order>,
  pub items: Vec<OrderItem>,
  pub redirect: Option<String>,
}

pub struct CheckoutOrchestrator {
  store: Arc<dyn ShopStore>,
  gateway: Arc<dyn PaymentGateway>,
  config: CheckoutConfig,
  pipeline: Pipeline<CheckoutCtxData, ShopError>,
}

impl CheckoutOrchestrator {
  pub fn new(
    store: Arc<dyn ShopStore>,
    gateway: Arc<dyn PaymentGateway>,
    config: CheckoutConfig,
  ) -> ShopResult<Self> {
    let pipeline = build_checkout_pipeline()?;
    info!(steps = ?pipeline.step_names(), gateway = gateway.name(), "Checkout pipeline assembled.");
    Ok(Self {
      store,
      gateway,
      config,
      pipeline,
    })
  }

  pub fn config(&self) -> &CheckoutConfig {
    &self.config
  }

  pub fn gateway(&self) -> &dyn PaymentGateway {
    self.gateway.as_ref()
  }

  /// Creates an order from the session's cart.
  ///
  /// A second call while one is still running for the same session is rejected with
  /// [`ShopError::CheckoutInProgress`] and writes nothing.
  #[instrument(
    name = "checkout::create_order",
    skip_all,
    fields(user_id = ?session.identity().map(|i| i.user_id))
  )]
  pub async fn create_order(&self, session: &ShopSession) -> ShopResult<CheckoutReceipt> {
    let _processing = session.begin_processing()?;

    let ctx = StepContext::new(CheckoutCtxData {
      store: self.store.clone(),
      config: self.config.clone(),
      identity: session.identity().cloned(),
      cart: session.cart().cloned(),
      lines: Vec::new(),
      order: None,
      items: Vec::new(),
      redirect: None,
    });

    match self.pipeline.run(ctx.clone()).await {
      Ok(PipelineResult::Completed) => {}
      Ok(PipelineResult::Stopped) => {
        return Err(PipelineError::Halted {
          pipeline: PIPELINE_NAME,
        }
        .into())
      }
      Err(e) => {
        warn!(error = %e, "Checkout did not complete.");
        return Err(e);
      }
    }

    let mut data = ctx.write();
    let order = data.order.take().ok_or(PipelineError::Incomplete {
      pipeline: PIPELINE_NAME,
      missing: "an order",
    })?;
    let redirect = data.redirect.take().ok_or(PipelineError::Incomplete {
      pipeline: PIPELINE_NAME,
      missing: "a redirect",
    })?;
    let items = std::mem::take(&mut data.items);
    info!(order_id = %order.id, total_cents = order.total_amount_cents, "Order created! Review and complete payment.");
    Ok(CheckoutReceipt { order, items, redirect })
  }

  /// Hands a pending order to the payment gateway and records the outcome on the order.
  #[instrument(name = "checkout::process_payment", skip(self), fields(gateway = self.gateway.name()))]
  pub async fn process_payment(&self, order_id: Uuid) -> ShopResult<PaymentOutcome> {
    let order = self
      .store
      .get_order(order_id)
      .await?
      .ok_or_else(|| ShopError::not_found("Order", order_id))?;
    if order.status != OrderStatus::Pending {
      return Err(ShopError::Validation(format!(
        "Order {} is already {}.",
        order.reference(),
        order.status
      )));
    }

    let outcome = self.gateway.capture(&order).await?;
    let status = match &outcome {
      PaymentOutcome::Paid { .. } => OrderStatus::Paid,
      PaymentOutcome::Declined { .. } => OrderStatus::Failed,
    };
    self
      .store
      .update_order_status(order_id, status)
      .await?
      .ok_or_else(|| ShopError::not_found("Order", order_id))?;
    info!(%status, "Order status updated after payment.");
    Ok(outcome)
  }
}

pub fn build_checkout_pipeline() -> ShopResult<Pipeline<CheckoutCtxData, ShopError>> {
  let mut p = Pipeline::<CheckoutCtxData, ShopError>::new(&[
    ("require_identity", false),
    ("require_items", false),
    ("insert_order", false),
    ("insert_order_items", false),
    ("hold_for_payment", true),
    ("clear_cart", false),
    ("resolve_redirect", false),
  ]);

  p.on("require_identity", require_identity)?;
  p.on("require_items", require_items)?;
  p.on("insert_order", insert_order)?;
  p.on("insert_order_items", insert_order_items)?;
  p.on("hold_for_payment", hold_for_payment)?;
  p.skip_if("hold_for_payment", |data: &CheckoutCtxData| data.config.payment_hold.is_zero())?;
  p.on("clear_cart", clear_cart)?;
  p.on("resolve_redirect", resolve_redirect)?;
  Ok(p)
}

async fn require_identity(ctx: StepContext<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  if ctx.read().identity.is_none() {
    warn!("Checkout attempted without a signed-in identity.");
    return Err(ShopError::Unauthenticated("Please login to checkout".to_string()));
  }
  Ok(PipelineControl::Continue)
}

async fn require_items(ctx: StepContext<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  let lines = {
    let data = ctx.read();
    data.cart.as_ref().map(CartStore::items).unwrap_or_default()
  };
  if lines.is_empty() {
    warn!("Checkout attempted with an empty cart.");
    return Err(ShopError::EmptyCart);
  }
  info!(lines = lines.len(), "Cart snapshot taken for checkout.");
  ctx.write().lines = lines;
  Ok(PipelineControl::Continue)
}

async fn insert_order(ctx: StepContext<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  let (store, new_order) = {
    let data = ctx.read();
    let user_id = data
      .identity
      .as_ref()
      .map(|i| i.user_id)
      .ok_or_else(|| ShopError::Unauthenticated("Please login to checkout".to_string()))?;
    let new_order = NewOrder {
      user_id,
      total_amount_cents: pricing::total_with_tax(pricing::cart_total(&data.lines)?)?,
      status: OrderStatus::Pending,
      currency: data.config.currency.clone(),
    };
    (data.store.clone(), new_order)
  };

  match store.insert_order(new_order).await {
    Ok(order) => {
      info!(order_id = %order.id, total_cents = order.total_amount_cents, "Order row inserted.");
      ctx.write().order = Some(order);
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      error!(error = %e, "Checkout error: order insert failed.");
      Err(ShopError::CheckoutFailed { source: e })
    }
  }
}

async fn insert_order_items(ctx: StepContext<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  let (store, order_id, rollback, new_items) = {
    let data = ctx.read();
    let order_id = data.order.as_ref().map(|o| o.id).ok_or(PipelineError::Incomplete {
      pipeline: PIPELINE_NAME,
      missing: "an order before its items",
    })?;
    let new_items: Vec<NewOrderItem> = data
      .lines
      .iter()
      .map(|line| NewOrderItem {
        order_id,
        product_id: line.product_id,
        quantity: line.quantity,
        price_cents: line.product.price_cents,
      })
      .collect();
    (data.store.clone(), order_id, data.config.rollback_orphaned_orders, new_items)
  };

  match store.insert_order_items(new_items).await {
    Ok(items) => {
      info!(%order_id, count = items.len(), "Order items inserted.");
      ctx.write().items = items;
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      error!(%order_id, error = %e, "Checkout error: order items insert failed.");
      if rollback {
        compensate_orphaned_order(store.as_ref(), order_id).await;
        ctx.write().order = None;
      } else {
        warn!(%order_id, "Order row left without items.");
      }
      Err(ShopError::CheckoutFailed { source: e })
    }
  }
}

async fn compensate_orphaned_order(store: &dyn ShopStore, order_id: Uuid) {
  match store.delete_order(order_id).await {
    Ok(()) => info!(%order_id, "Orphaned order rolled back."),
    Err(e) => error!(%order_id, error = %e, "Failed to roll back orphaned order."),
  }
}

async fn hold_for_payment(ctx: StepContext<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  let hold = { ctx.read().config.payment_hold };
  info!(hold_ms = hold.as_millis() as u64, "Holding before cart is cleared.");
  tokio::time::sleep(hold).await;
  Ok(PipelineControl::Continue)
}

async fn clear_cart(ctx: StepContext<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  let cart = { ctx.read().cart.clone() };
  if let Some(cart) = cart {
    cart.clear().await.map_err(|e| match e {
      ShopError::Store(source) => {
        error!(error = %source, "Checkout error: cart could not be cleared.");
        ShopError::CheckoutFailed { source }
      }
      other => other,
    })?;
  }
  Ok(PipelineControl::Continue)
}

async fn resolve_redirect(ctx: StepContext<CheckoutCtxData>) -> ShopResult<PipelineControl> {
  let mut data = ctx.write();
  let order_id = data.order.as_ref().map(|o| o.id).ok_or(PipelineError::Incomplete {
    pipeline: PIPELINE_NAME,
    missing: "an order to redirect to",
  })?;
  data.redirect = Some(review_path(order_id));
  Ok(PipelineControl::Continue)
}

/// Path of the review page for an order.
pub fn review_path(order_id: Uuid) -> String {
  format!("/checkout/{}", order_id)
}
