// darkroom_server/src/web/extractors.rs

//! Request identity. The hosted identity provider sits in front of this service and forwards
//! the signed-in user as `X-User-ID` (and optionally `X-User-Name`).

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use darkroom::models::Identity;
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_NAME_HEADER: &str = "X-User-Name";

/// Reads the identity headers. `Ok(None)` when no user header is present at all.
fn identity_from_headers(req: &HttpRequest) -> Result<Option<Identity>, AppError> {
  let Some(raw) = req.headers().get(USER_ID_HEADER) else {
    return Ok(None);
  };
  let user_id = raw
    .to_str()
    .ok()
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .ok_or_else(|| {
      warn!("Malformed {} header.", USER_ID_HEADER);
      AppError::Auth(format!("Invalid {} header.", USER_ID_HEADER))
    })?;

  let identity = match req
    .headers()
    .get(USER_NAME_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|name| !name.is_empty())
  {
    Some(name) => Identity::new(user_id).with_display_name(name),
    None => Identity::new(user_id),
  };
  Ok(Some(identity))
}

/// A signed-in user. Rejects the request with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub identity: Identity,
}

impl AuthenticatedUser {
  pub fn user_id(&self) -> Uuid {
    self.identity.user_id
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(match identity_from_headers(req) {
      Ok(Some(identity)) => Ok(AuthenticatedUser { identity }),
      Ok(None) => {
        warn!("AuthenticatedUser extractor: missing {} header.", USER_ID_HEADER);
        Err(AppError::Auth("Please login to view your cart".to_string()))
      }
      Err(e) => Err(e),
    })
  }
}

/// The caller's identity when there is one. Routes that report "not signed in" themselves
/// take this instead of [`AuthenticatedUser`].
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl FromRequest for MaybeIdentity {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(identity_from_headers(req).map(MaybeIdentity))
  }
}
