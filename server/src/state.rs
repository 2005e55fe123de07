// darkroom_server/src/state.rs
use crate::config::AppConfig;
use crate::errors::Result;
use darkroom::{Catalog, CheckoutOrchestrator, PaymentGateway, PendingGateway, SessionRegistry, ShopStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn ShopStore>,
  pub catalog: Arc<Catalog>,
  pub sessions: Arc<SessionRegistry>,
  pub checkout: Arc<CheckoutOrchestrator>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// State over `store` with no payment gateway connected.
  pub fn new(store: Arc<dyn ShopStore>, config: Arc<AppConfig>) -> Result<Self> {
    Self::with_gateway(store, Arc::new(PendingGateway), config)
  }

  pub fn with_gateway(
    store: Arc<dyn ShopStore>,
    gateway: Arc<dyn PaymentGateway>,
    config: Arc<AppConfig>,
  ) -> Result<Self> {
    let checkout = CheckoutOrchestrator::new(store.clone(), gateway, config.checkout_config())?;
    Ok(Self {
      catalog: Arc::new(Catalog::new(store.clone())),
      sessions: Arc::new(SessionRegistry::with_limits(store.clone(), config.session_limits())),
      checkout: Arc::new(checkout),
      store,
      config,
    })
  }
}
