// darkroom_server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use darkroom::models::CartItem;
use darkroom::{format_cents, CartStore, OrderSummary, ShopResult};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

fn default_quantity() -> i64 {
  1
}

#[derive(Deserialize, Debug)]
pub struct AddToCartPayload {
  pub product_id: Uuid,
  #[serde(default = "default_quantity")]
  pub quantity: i64,
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityPayload {
  /// Zero or less removes the line.
  pub quantity: i64,
}

/// The cart as the storefront renders it.
#[derive(Serialize, Debug)]
pub struct CartView {
  pub items: Vec<CartItem>,
  pub count: i64,
  pub summary: OrderSummary,
  pub total_display: String,
}

impl CartView {
  pub fn of(cart: &CartStore, currency: &str) -> ShopResult<Self> {
    let summary = cart.summary()?;
    Ok(Self {
      items: cart.items(),
      count: cart.cart_count(),
      total_display: format_cents(summary.total_cents, currency),
      summary,
    })
  }
}

async fn open_cart(app_state: &AppState, auth_user: &AuthenticatedUser) -> Result<CartStore, AppError> {
  let session = app_state.sessions.open(auth_user.identity.clone()).await?;
  Ok(session.require_cart()?.clone())
}

#[instrument(name = "handler::get_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let cart = open_cart(&app_state, &auth_user).await?;
  Ok(HttpResponse::Ok().json(CartView::of(&cart, &app_state.config.shop_currency)?))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, req_payload, auth_user),
    fields(user_id = %auth_user.user_id(), product_id = %req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let cart = open_cart(&app_state, &auth_user).await?;
  cart.add_to_cart(req_payload.product_id, req_payload.quantity).await?;
  info!(count = cart.cart_count(), "Item added to cart.");
  Ok(HttpResponse::Ok().json(CartView::of(&cart, &app_state.config.shop_currency)?))
}

#[instrument(
    name = "handler::update_cart_quantity",
    skip(app_state, path, req_payload, auth_user),
    fields(user_id = %auth_user.user_id(), product_id = %path.as_ref(), quantity = req_payload.quantity)
)]
pub async fn update_quantity_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateQuantityPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let cart = open_cart(&app_state, &auth_user).await?;
  cart.update_quantity(path.into_inner(), req_payload.quantity).await?;
  Ok(HttpResponse::Ok().json(CartView::of(&cart, &app_state.config.shop_currency)?))
}

#[instrument(
    name = "handler::remove_from_cart",
    skip(app_state, path, auth_user),
    fields(user_id = %auth_user.user_id(), product_id = %path.as_ref())
)]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let cart = open_cart(&app_state, &auth_user).await?;
  cart.remove_from_cart(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(CartView::of(&cart, &app_state.config.shop_currency)?))
}
