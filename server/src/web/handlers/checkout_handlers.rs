// darkroom_server/src/web/handlers/checkout_handlers.rs

use actix_web::{http::header, web, HttpResponse};
use darkroom::{format_cents, ShopError, ShopSession, ShopStore};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, MaybeIdentity};

/// Creates a pending order from the caller's cart and points them at its review page.
///
/// Anonymous callers reach the checkout flow too; it refuses them before writing anything.
#[instrument(
    name = "handler::start_checkout",
    skip(app_state, identity),
    fields(user_id = ?identity.0.as_ref().map(|i| i.user_id))
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  identity: MaybeIdentity,
) -> Result<HttpResponse, AppError> {
  let session = match identity.0 {
    Some(identity) => app_state.sessions.open(identity).await?,
    None => Arc::new(ShopSession::anonymous()),
  };

  let receipt = match app_state.checkout.create_order(&session).await {
    Ok(receipt) => receipt,
    Err(e) => {
      warn!(error = %e, "Checkout failed.");
      return Err(e.into());
    }
  };
  info!(order_id = %receipt.order.id, "Checkout completed.");

  let currency = receipt.order.currency.clone();
  let location = app_state.config.absolute_url(&receipt.redirect);
  Ok(
    HttpResponse::Created()
      .insert_header((header::LOCATION, location))
      .json(json!({
          "message": "Order created! Review and complete payment.",
          "orderId": receipt.order.id,
          "reference": receipt.order.reference(),
          "totalDisplay": format_cents(receipt.order.total_amount_cents, &currency),
          "redirect": receipt.redirect,
          "order": receipt.order,
          "items": receipt.items,
      })),
  )
}

/// Hands an order the caller owns to the payment gateway.
#[instrument(
    name = "handler::pay_order",
    skip(app_state, path, auth_user),
    fields(user_id = %auth_user.user_id(), order_id = %path.as_ref())
)]
pub async fn pay_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let order = app_state
    .store
    .get_order(order_id)
    .await
    .map_err(ShopError::from)?
    .filter(|order| order.user_id == auth_user.user_id())
    .ok_or_else(|| AppError::from(ShopError::not_found("Order", order_id)))?;

  let outcome = app_state.checkout.process_payment(order.id).await?;
  info!(?outcome, "Payment processed.");
  Ok(HttpResponse::Ok().json(json!({ "orderId": order.id, "payment": outcome })))
}
