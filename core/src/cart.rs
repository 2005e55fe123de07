// darkroom/src/cart.rs

//! The Cart Store: one user's cart lines, kept in step with the `cart_items` table.

use crate::error::{ShopError, ShopResult};
use crate::models::CartItem;
use crate::pricing::{self, OrderSummary};
use crate::store::ShopStore;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Default)]
struct CartState {
  items: Vec<CartItem>,
  loading: bool,
  /// Bumped by every reload and every local reset; a reload only lands if it is still the latest.
  generation: u64,
}

struct CartInner {
  store: Arc<dyn ShopStore>,
  user_id: Uuid,
  state: RwLock<CartState>,
}

/// Cart for a single signed-in user. Clones share the same state.
///
/// Every mutation is a store round trip followed by a reload of the user's lines. Local
/// state is replaced only after the store call succeeds, so a failed mutation leaves the
/// previously loaded lines in place.
#[derive(Clone)]
pub struct CartStore {
  inner: Arc<CartInner>,
}

impl std::fmt::Debug for CartStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = self.inner.state.read();
    f.debug_struct("CartStore")
      .field("user_id", &self.inner.user_id)
      .field("lines", &state.items.len())
      .field("loading", &state.loading)
      .finish()
  }
}

impl CartStore {
  /// Creates the cart and loads the user's current lines.
  pub async fn open(store: Arc<dyn ShopStore>, user_id: Uuid) -> ShopResult<Self> {
    let cart = Self {
      inner: Arc::new(CartInner {
        store,
        user_id,
        state: RwLock::new(CartState::default()),
      }),
    };
    cart.refresh().await?;
    Ok(cart)
  }

  pub fn user_id(&self) -> Uuid {
    self.inner.user_id
  }

  pub fn items(&self) -> Vec<CartItem> {
    self.inner.state.read().items.clone()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.state.read().items.is_empty()
  }

  /// Σ price × quantity over the loaded lines.
  pub fn cart_total(&self) -> ShopResult<i64> {
    pricing::cart_total(&self.inner.state.read().items)
  }

  /// Σ quantity over the loaded lines.
  pub fn cart_count(&self) -> i64 {
    pricing::cart_count(&self.inner.state.read().items)
  }

  pub fn summary(&self) -> ShopResult<OrderSummary> {
    OrderSummary::for_cart(&self.inner.state.read().items)
  }

  pub fn is_loading(&self) -> bool {
    self.inner.state.read().loading
  }

  fn quantity_of(&self, product_id: Uuid) -> Option<i64> {
    self
      .inner
      .state
      .read()
      .items
      .iter()
      .find(|item| item.product_id == product_id)
      .map(|item| item.quantity)
  }

  /// Quantity that would be stored after adding `quantity` to the product's line.
  fn merged_quantity(&self, product_id: Uuid, quantity: i64) -> ShopResult<i64> {
    let merged = self
      .quantity_of(product_id)
      .unwrap_or(0)
      .checked_add(quantity)
      .ok_or_else(|| ShopError::Validation(format!("Quantity cannot exceed {}.", pricing::MAX_LINE_QUANTITY)))?;
    pricing::check_quantity(merged)?;
    Ok(merged)
  }

  /// Checks that the cart, with the product's line set to `quantity`, still prices.
  fn check_priceable(&self, product_id: Uuid, unit_price_cents: i64, quantity: i64) -> ShopResult<()> {
    let others = self
      .inner
      .state
      .read()
      .items
      .iter()
      .filter(|item| item.product_id != product_id)
      .cloned()
      .collect::<Vec<_>>();
    let subtotal = pricing::cart_total(&others)?
      .checked_add(pricing::line_total(unit_price_cents, quantity)?)
      .ok_or_else(|| ShopError::Validation("Order amount is too large.".to_string()))?;
    pricing::total_with_tax(subtotal).map(|_| ())
  }

  /// Reloads the user's lines. When reloads overlap, only the most recently started one
  /// replaces the local lines.
  #[instrument(name = "cart::refresh", skip(self), fields(user_id = %self.inner.user_id))]
  pub async fn refresh(&self) -> ShopResult<()> {
    let generation = {
      let mut state = self.inner.state.write();
      state.generation += 1;
      state.loading = true;
      state.generation
    };
    let result = self.inner.store.list_cart_items(self.inner.user_id).await;
    let mut state = self.inner.state.write();
    if state.generation != generation {
      debug!(generation, latest = state.generation, "Superseded cart reload discarded.");
      return result.map(|_| ()).map_err(ShopError::from);
    }
    state.loading = false;
    match result {
      Ok(items) => {
        state.items = items;
        Ok(())
      }
      Err(e) => {
        warn!(error = %e, "Failed to load cart lines.");
        Err(e.into())
      }
    }
  }

  /// Adds `quantity` of a product, merging into an existing line.
  #[instrument(name = "cart::add_to_cart", skip(self), fields(user_id = %self.inner.user_id))]
  pub async fn add_to_cart(&self, product_id: Uuid, quantity: i64) -> ShopResult<()> {
    pricing::check_quantity(quantity)?;
    let Some(product) = self.inner.store.get_product(product_id).await? else {
      warn!("Product not found for cart add.");
      return Err(ShopError::not_found("Product", product_id));
    };

    let new_quantity = self.merged_quantity(product_id, quantity)?;
    self.check_priceable(product_id, product.price_cents, new_quantity)?;
    self
      .inner
      .store
      .upsert_cart_item(self.inner.user_id, product_id, new_quantity)
      .await?;
    info!(new_quantity, "Cart line added or increased.");
    self.refresh().await
  }

  /// Sets a line's quantity. Zero or less removes the line.
  #[instrument(name = "cart::update_quantity", skip(self), fields(user_id = %self.inner.user_id))]
  pub async fn update_quantity(&self, product_id: Uuid, new_quantity: i64) -> ShopResult<()> {
    let unit_price = self
      .inner
      .state
      .read()
      .items
      .iter()
      .find(|item| item.product_id == product_id)
      .map(|item| item.product.price_cents);
    let Some(unit_price) = unit_price else {
      return Err(ShopError::not_found("Cart item", product_id));
    };
    if new_quantity <= 0 {
      return self.remove_from_cart(product_id).await;
    }
    pricing::check_quantity(new_quantity)?;
    self.check_priceable(product_id, unit_price, new_quantity)?;
    self
      .inner
      .store
      .upsert_cart_item(self.inner.user_id, product_id, new_quantity)
      .await?;
    info!("Cart line quantity updated.");
    self.refresh().await
  }

  #[instrument(name = "cart::remove_from_cart", skip(self), fields(user_id = %self.inner.user_id))]
  pub async fn remove_from_cart(&self, product_id: Uuid) -> ShopResult<()> {
    let deleted = self
      .inner
      .store
      .delete_cart_item(self.inner.user_id, product_id)
      .await?;
    if !deleted {
      warn!("No cart line to remove.");
    }
    self.refresh().await
  }

  #[instrument(name = "cart::clear", skip(self), fields(user_id = %self.inner.user_id))]
  pub async fn clear(&self) -> ShopResult<()> {
    self.inner.store.clear_cart(self.inner.user_id).await?;
    {
      let mut state = self.inner.state.write();
      state.generation += 1;
      state.loading = false;
      state.items.clear();
    }
    info!("Cart cleared.");
    Ok(())
  }
}
