// darkroom_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use darkroom::ShopError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Shop Error: {source}")]
  Shop {
    #[from]
    source: ShopError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

// Handlers that use `?` on anyhow results still get a typed database error when one is wrapped.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl AppError {
  /// The message a client sees. Backend details stay in the logs.
  fn public_message(&self) -> String {
    match self {
      AppError::Validation(m) | AppError::Auth(m) | AppError::NotFound(m) => m.clone(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Sqlx(_) => "Database operation failed".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
      AppError::Shop { source } => match source {
        ShopError::Unauthenticated(m) | ShopError::Validation(m) => m.clone(),
        ShopError::Store(_) | ShopError::Pipeline(_) => "Store operation failed".to_string(),
        other => other.to_string(),
      },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Shop { source } => match source {
        ShopError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        ShopError::EmptyCart | ShopError::Validation(_) => StatusCode::BAD_REQUEST,
        ShopError::NotFound { .. } => StatusCode::NOT_FOUND,
        ShopError::CheckoutInProgress => StatusCode::CONFLICT,
        ShopError::PaymentUnavailable { .. } => StatusCode::NOT_IMPLEMENTED,
        ShopError::CheckoutFailed { .. } | ShopError::Store(_) | ShopError::Pipeline(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, status = status.as_u16(), "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with error");
    }
    HttpResponse::build(status).json(json!({ "error": self.public_message() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use darkroom::{PipelineError, StoreError};
  use uuid::Uuid;

  fn status_of(err: ShopError) -> StatusCode {
    AppError::from(err).status_code()
  }

  #[test]
  fn shop_errors_map_to_http_statuses() {
    assert_eq!(status_of(ShopError::Unauthenticated("x".into())), StatusCode::UNAUTHORIZED);
    assert_eq!(status_of(ShopError::EmptyCart), StatusCode::BAD_REQUEST);
    assert_eq!(status_of(ShopError::not_found("Order", Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(status_of(ShopError::CheckoutInProgress), StatusCode::CONFLICT);
    assert_eq!(
      status_of(ShopError::PaymentUnavailable {
        order_id: Uuid::nil(),
        reason: "none".into()
      }),
      StatusCode::NOT_IMPLEMENTED
    );
    assert_eq!(
      status_of(ShopError::CheckoutFailed {
        source: StoreError::MissingReference("p".into())
      }),
      StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
      status_of(ShopError::Pipeline(PipelineError::Halted { pipeline: "checkout" })),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn backend_details_are_not_exposed() {
    let err = AppError::from(ShopError::Store(StoreError::backend(
      "get_order",
      anyhow::anyhow!("connection refused on 10.0.0.7"),
    )));
    assert_eq!(err.public_message(), "Store operation failed");

    let err = AppError::from(ShopError::CheckoutFailed {
      source: StoreError::backend("insert_order", anyhow::anyhow!("boom")),
    });
    assert_eq!(err.public_message(), "Failed to process checkout. Please try again.");
  }

  #[test]
  fn anyhow_wrapping_sqlx_keeps_database_variant() {
    let err = AppError::from(anyhow::Error::new(sqlx::Error::RowNotFound));
    assert!(matches!(err, AppError::Sqlx(_)));
    let err = AppError::from(anyhow::anyhow!("plain"));
    assert!(matches!(err, AppError::Internal(ref m) if m == "plain"));
  }
}
