// darkroom/src/session.rs

//! Per-user session context: the identity, its cart, and the checkout-in-flight flag.
//!
//! Sessions are handed explicitly to the checkout and review flows; the registry that owns
//! them lives in application state rather than in a global.

use crate::cart::CartStore;
use crate::error::{ShopError, ShopResult};
use crate::models::Identity;
use crate::store::ShopStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct ShopSession {
  identity: Option<Identity>,
  cart: Option<CartStore>,
  processing: AtomicBool,
}

impl ShopSession {
  /// A session for a visitor who has not signed in. It has no cart.
  pub fn anonymous() -> Self {
    Self {
      identity: None,
      cart: None,
      processing: AtomicBool::new(false),
    }
  }

  /// Opens a signed-in session and loads the user's cart.
  pub async fn signed_in(store: Arc<dyn ShopStore>, identity: Identity) -> ShopResult<Self> {
    let cart = CartStore::open(store, identity.user_id).await?;
    Ok(Self {
      identity: Some(identity),
      cart: Some(cart),
      processing: AtomicBool::new(false),
    })
  }

  pub fn identity(&self) -> Option<&Identity> {
    self.identity.as_ref()
  }

  pub fn cart(&self) -> Option<&CartStore> {
    self.cart.as_ref()
  }

  /// The cart, or the "please login" error for anonymous sessions.
  pub fn require_cart(&self) -> ShopResult<&CartStore> {
    self
      .cart
      .as_ref()
      .ok_or_else(|| ShopError::Unauthenticated("Please login to view your cart".to_string()))
  }

  pub fn is_processing(&self) -> bool {
    self.processing.load(Ordering::SeqCst)
  }

  /// Marks a checkout as in flight. Fails if one already is.
  pub(crate) fn begin_processing(&self) -> ShopResult<ProcessingGuard<'_>> {
    self
      .processing
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .map_err(|_| ShopError::CheckoutInProgress)?;
    Ok(ProcessingGuard { session: self })
  }
}

/// Clears the processing flag when the checkout finishes, however it finishes.
pub(crate) struct ProcessingGuard<'a> {
  session: &'a ShopSession,
}

impl Drop for ProcessingGuard<'_> {
  fn drop(&mut self) {
    self.session.processing.store(false, Ordering::SeqCst);
  }
}

/// Bounds on the live-session registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
  /// Most sessions kept at once. Opening one more evicts the least recently used idle session.
  pub max_sessions: usize,
  /// A session unused for this long is dropped on the next sweep.
  pub idle_timeout: Duration,
}

impl Default for SessionLimits {
  fn default() -> Self {
    Self {
      max_sessions: 10_000,
      idle_timeout: Duration::from_secs(30 * 60),
    }
  }
}

struct LiveSession {
  session: Arc<ShopSession>,
  last_seen: Instant,
}

/// Live sessions keyed by user, bounded by [`SessionLimits`]. Sessions with a checkout in
/// flight are never evicted.
pub struct SessionRegistry {
  store: Arc<dyn ShopStore>,
  limits: SessionLimits,
  sessions: Mutex<HashMap<Uuid, LiveSession>>,
}

impl SessionRegistry {
  pub fn new(store: Arc<dyn ShopStore>) -> Self {
    Self::with_limits(store, SessionLimits::default())
  }

  pub fn with_limits(store: Arc<dyn ShopStore>, limits: SessionLimits) -> Self {
    Self {
      store,
      limits,
      sessions: Mutex::new(HashMap::new()),
    }
  }

  pub fn limits(&self) -> SessionLimits {
    self.limits
  }

  /// Returns the user's session, opening it on first use. An existing session's cart is
  /// reloaded so it reflects writes made elsewhere.
  pub async fn open(&self, identity: Identity) -> ShopResult<Arc<ShopSession>> {
    let existing = {
      let mut sessions = self.sessions.lock();
      sessions.get_mut(&identity.user_id).map(|live| {
        live.last_seen = Instant::now();
        live.session.clone()
      })
    };
    if let Some(session) = existing {
      session.require_cart()?.refresh().await?;
      debug!(user_id = %identity.user_id, "Reusing live session.");
      return Ok(session);
    }

    let user_id = identity.user_id;
    let session = Arc::new(ShopSession::signed_in(self.store.clone(), identity).await?);
    let mut sessions = self.sessions.lock();
    if !sessions.contains_key(&user_id) {
      self.make_room(&mut sessions);
    }
    // Another request may have opened the same session while the cart was loading.
    let live = sessions.entry(user_id).or_insert(LiveSession {
      session,
      last_seen: Instant::now(),
    });
    live.last_seen = Instant::now();
    let session = live.session.clone();
    info!(%user_id, live = sessions.len(), "Session opened.");
    Ok(session)
  }

  pub fn close(&self, user_id: Uuid) -> bool {
    let closed = self.sessions.lock().remove(&user_id).is_some();
    if closed {
      info!(%user_id, "Session closed.");
    }
    closed
  }

  /// Drops every session idle for longer than the timeout. Returns how many were dropped.
  pub fn evict_idle(&self) -> usize {
    let mut sessions = self.sessions.lock();
    self.drop_expired(&mut sessions)
  }

  pub fn live_sessions(&self) -> usize {
    self.sessions.lock().len()
  }

  fn drop_expired(&self, sessions: &mut HashMap<Uuid, LiveSession>) -> usize {
    let before = sessions.len();
    let timeout = self.limits.idle_timeout;
    sessions.retain(|_, live| live.session.is_processing() || live.last_seen.elapsed() <= timeout);
    let dropped = before - sessions.len();
    if dropped > 0 {
      debug!(dropped, "Idle sessions expired.");
    }
    dropped
  }

  fn make_room(&self, sessions: &mut HashMap<Uuid, LiveSession>) {
    self.drop_expired(sessions);
    while sessions.len() >= self.limits.max_sessions.max(1) {
      let oldest = sessions
        .iter()
        .filter(|(_, live)| !live.session.is_processing())
        .min_by_key(|(_, live)| live.last_seen)
        .map(|(user_id, _)| *user_id);
      let Some(user_id) = oldest else {
        warn!(live = sessions.len(), "Session limit reached with every session mid-checkout.");
        return;
      };
      sessions.remove(&user_id);
      debug!(%user_id, "Least recently used session evicted.");
    }
  }
}
