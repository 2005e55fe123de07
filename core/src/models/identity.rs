// darkroom/src/models/identity.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The signed-in user as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id: Uuid,
  pub display_name: Option<String>,
}

impl Identity {
  pub fn new(user_id: Uuid) -> Self {
    Self {
      user_id,
      display_name: None,
    }
  }

  pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
    self.display_name = Some(name.into());
    self
  }
}
