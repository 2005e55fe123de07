// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset of these helpers.

use async_trait::async_trait;
use darkroom::models::{Identity, Order};
use darkroom::{
  CheckoutConfig, CheckoutOrchestrator, MemoryStore, PaymentGateway, PaymentOutcome, PendingGateway, ShopResult,
  ShopSession, ShopStore,
};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---
pub fn customer() -> Identity {
  Identity::new(Uuid::new_v4()).with_display_name("Ada Lovelace")
}

pub fn seeded_store() -> Arc<MemoryStore> {
  Arc::new(MemoryStore::seeded())
}

pub fn as_shop_store(store: &Arc<MemoryStore>) -> Arc<dyn ShopStore> {
  store.clone()
}

pub async fn session_for(store: &Arc<MemoryStore>, identity: Identity) -> ShopSession {
  ShopSession::signed_in(as_shop_store(store), identity)
    .await
    .expect("session should open against the memory store")
}

pub fn orchestrator(store: &Arc<MemoryStore>) -> CheckoutOrchestrator {
  orchestrator_with(store, CheckoutConfig::default(), Arc::new(PendingGateway))
}

pub fn orchestrator_with(
  store: &Arc<MemoryStore>,
  config: CheckoutConfig,
  gateway: Arc<dyn PaymentGateway>,
) -> CheckoutOrchestrator {
  CheckoutOrchestrator::new(as_shop_store(store), gateway, config).expect("checkout pipeline should assemble")
}

// --- A gateway that settles every order ---
pub static GATEWAY_CAPTURES: Lazy<AtomicUsize> = Lazy::new(|| AtomicUsize::new(0));

pub fn reset_gateway_captures() {
  GATEWAY_CAPTURES.store(0, Ordering::SeqCst);
}

pub fn gateway_captures() -> usize {
  GATEWAY_CAPTURES.load(Ordering::SeqCst)
}

#[derive(Debug, Clone, Copy)]
pub struct RecordingGateway {
  pub approve: bool,
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
  fn name(&self) -> &'static str {
    "recording"
  }

  fn accepts_payments(&self) -> bool {
    true
  }

  async fn capture(&self, order: &Order) -> ShopResult<PaymentOutcome> {
    GATEWAY_CAPTURES.fetch_add(1, Ordering::SeqCst);
    if self.approve {
      Ok(PaymentOutcome::Paid {
        gateway_reference: format!("test_{}", order.id.simple()),
      })
    } else {
      Ok(PaymentOutcome::Declined {
        reason: "card declined".to_string(),
      })
    }
  }
}
