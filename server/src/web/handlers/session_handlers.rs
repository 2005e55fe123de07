// darkroom_server/src/web/handlers/session_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

/// Drops the caller's live session. The stored cart is untouched.
#[instrument(name = "handler::close_session", skip(app_state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn close_session_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let closed = app_state.sessions.close(auth_user.user_id());
  Ok(HttpResponse::Ok().json(json!({ "closed": closed })))
}
