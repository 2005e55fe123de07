// darkroom_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use darkroom::review::parse_order_id;
use darkroom::{format_cents, load_review, ReviewState};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::MaybeIdentity;

fn not_found() -> HttpResponse {
  HttpResponse::NotFound().json(json!({ "state": "not_found", "error": "Order not found" }))
}

/// The review page data for one order.
///
/// Signed-in callers only see their own orders; anything else reads as not found.
#[instrument(name = "handler::review_order", skip(app_state, path, identity), fields(order_id = %path.as_str()))]
pub async fn review_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  identity: MaybeIdentity,
) -> Result<HttpResponse, AppError> {
  let Some(order_id) = parse_order_id(&path) else {
    info!("Malformed order id.");
    return Ok(not_found());
  };
  let viewer = identity.0.map(|i| i.user_id);

  let state = load_review(app_state.store.as_ref(), app_state.checkout.gateway(), order_id, viewer).await?;
  let review = match state {
    ReviewState::Found(review) => review,
    ReviewState::NotFound => return Ok(not_found()),
  };

  let currency = review.order.currency.clone();
  Ok(HttpResponse::Ok().json(json!({
      "state": "found",
      "display": {
          "subtotal": format_cents(review.summary.subtotal_cents, &currency),
          "tax": format_cents(review.summary.tax_cents, &currency),
          "total": format_cents(review.summary.total_cents, &currency),
      },
      "totalMatchesStored": review.total_matches_stored(),
      "review": review,
  })))
}
