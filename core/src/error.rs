// darkroom/src/error.rs

//! Error taxonomy shared by the cart, checkout and review flows.

use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

/// Failures raised by the step engine itself rather than by step handlers.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Pipeline '{pipeline}' was halted before completion")]
  Halted { pipeline: &'static str },

  #[error("Pipeline '{pipeline}' completed without producing {missing}")]
  Incomplete { pipeline: &'static str, missing: &'static str },
}

/// Failures reported by a table store.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Table store operation '{operation}' failed: {source}")]
  Backend {
    operation: &'static str,
    #[source]
    source: AnyhowError,
  },

  /// A row came back from the store but does not form a valid record.
  #[error("Invalid row in '{table}': {reason}")]
  InvalidRow { table: &'static str, reason: String },

  /// A write referenced a row that does not exist (e.g. an order item for an unknown product).
  #[error("Missing reference: {0}")]
  MissingReference(String),
}

impl StoreError {
  pub fn backend(operation: &'static str, source: impl Into<AnyhowError>) -> Self {
    StoreError::Backend {
      operation,
      source: source.into(),
    }
  }

  pub fn invalid_row(table: &'static str, reason: impl Into<String>) -> Self {
    StoreError::InvalidRow {
      table,
      reason: reason.into(),
    }
  }
}

#[derive(Debug, Error)]
pub enum ShopError {
  /// No signed-in identity where one is required.
  #[error("Authentication required: {0}")]
  Unauthenticated(String),

  #[error("Your cart is empty")]
  EmptyCart,

  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("A checkout is already being processed for this session")]
  CheckoutInProgress,

  /// Either insert of the checkout failed. The message is the user-facing notification.
  #[error("Failed to process checkout. Please try again.")]
  CheckoutFailed {
    #[source]
    source: StoreError,
  },

  #[error("Payment is not available for order {order_id}: {reason}")]
  PaymentUnavailable { order_id: Uuid, reason: String },

  #[error("Store Error: {0}")]
  Store(#[from] StoreError),

  #[error("Pipeline Error: {0}")]
  Pipeline(#[from] PipelineError),
}

impl ShopError {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    ShopError::NotFound {
      entity,
      id: id.to_string(),
    }
  }
}

pub type ShopResult<T, E = ShopError> = std::result::Result<T, E>;
