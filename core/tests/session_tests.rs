// tests/session_tests.rs
mod common;

use common::*;
use darkroom::catalog::CUSTOM_PHOTO_BOOK;
use darkroom::{CartStore, SessionLimits, SessionRegistry, ShopError, ShopSession};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn registry_reuses_and_refreshes_live_sessions() {
  setup_tracing();
  let store = seeded_store();
  let registry = SessionRegistry::new(as_shop_store(&store));
  let identity = customer();

  let first = registry.open(identity.clone()).await.unwrap();
  // A write made outside the session, e.g. from another device.
  let elsewhere = CartStore::open(as_shop_store(&store), identity.user_id).await.unwrap();
  elsewhere.add_to_cart(CUSTOM_PHOTO_BOOK, 1).await.unwrap();

  let second = registry.open(identity.clone()).await.unwrap();
  assert!(Arc::ptr_eq(&first, &second));
  assert_eq!(second.cart().unwrap().cart_count(), 1);
  assert_eq!(registry.live_sessions(), 1);

  assert!(registry.close(identity.user_id));
  assert!(!registry.close(identity.user_id));
  assert_eq!(registry.live_sessions(), 0);
}

#[test]
fn anonymous_sessions_have_no_cart() {
  let session = ShopSession::anonymous();
  assert!(session.identity().is_none());
  assert!(matches!(session.require_cart(), Err(ShopError::Unauthenticated(_))));
}

#[tokio::test]
async fn a_full_registry_evicts_the_least_recently_used_session() {
  setup_tracing();
  let store = seeded_store();
  let limits = SessionLimits {
    max_sessions: 2,
    idle_timeout: Duration::from_secs(3600),
  };
  let registry = SessionRegistry::with_limits(as_shop_store(&store), limits);
  let (ada, grace, edsger) = (customer(), customer(), customer());

  let first = registry.open(ada.clone()).await.unwrap();
  tokio::time::sleep(Duration::from_millis(2)).await;
  registry.open(grace.clone()).await.unwrap();
  tokio::time::sleep(Duration::from_millis(2)).await;
  // Touching Ada's session makes Grace's the oldest.
  let again = registry.open(ada.clone()).await.unwrap();
  assert!(Arc::ptr_eq(&first, &again));
  tokio::time::sleep(Duration::from_millis(2)).await;
  registry.open(edsger.clone()).await.unwrap();

  assert_eq!(registry.live_sessions(), 2);
  assert!(!registry.close(grace.user_id));
  assert!(registry.close(ada.user_id));
  assert!(registry.close(edsger.user_id));
}

#[tokio::test]
async fn idle_sessions_expire() {
  setup_tracing();
  let store = seeded_store();
  let limits = SessionLimits {
    max_sessions: 100,
    idle_timeout: Duration::from_millis(20),
  };
  let registry = SessionRegistry::with_limits(as_shop_store(&store), limits);
  let stale = customer();

  registry.open(stale.clone()).await.unwrap();
  tokio::time::sleep(Duration::from_millis(40)).await;
  assert_eq!(registry.evict_idle(), 1);
  assert_eq!(registry.live_sessions(), 0);

  // Opening a session also sweeps expired ones.
  registry.open(stale.clone()).await.unwrap();
  tokio::time::sleep(Duration::from_millis(40)).await;
  registry.open(customer()).await.unwrap();
  assert_eq!(registry.live_sessions(), 1);
  assert!(!registry.close(stale.user_id));
}
