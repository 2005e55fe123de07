// darkroom/src/catalog.rs

//! The studio's product catalog: categories, seed products and filtered listing.

use crate::error::{ShopError, ShopResult};
use crate::models::Product;
use crate::store::ShopStore;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::{uuid, Uuid};

/// Shop categories. "All" is the absence of a filter.
pub const CATEGORIES: [&str; 5] = ["Prints", "Albums", "Digital", "Canvas", "Books"];

pub const ALL_CATEGORIES: &str = "All";

pub const PREMIUM_PRINT_COLLECTION: Uuid = uuid!("6f1d2b8e-2c1a-4f0e-9d1b-1a0000000001");
pub const WEDDING_ALBUM_LUXURY: Uuid = uuid!("6f1d2b8e-2c1a-4f0e-9d1b-1a0000000002");
pub const DIGITAL_GALLERY: Uuid = uuid!("6f1d2b8e-2c1a-4f0e-9d1b-1a0000000003");
pub const CANVAS_PRINT_SET: Uuid = uuid!("6f1d2b8e-2c1a-4f0e-9d1b-1a0000000004");
pub const PORTRAIT_SESSION_PRINTS: Uuid = uuid!("6f1d2b8e-2c1a-4f0e-9d1b-1a0000000005");
pub const CUSTOM_PHOTO_BOOK: Uuid = uuid!("6f1d2b8e-2c1a-4f0e-9d1b-1a0000000006");

/// The products the storefront launches with.
pub fn seed_products() -> Vec<Product> {
  let rows: [(Uuid, &str, &str, i64, &str, bool); 6] = [
    (
      PREMIUM_PRINT_COLLECTION,
      "Premium Print Collection",
      "High-quality prints on museum-grade paper",
      4500,
      "Prints",
      false,
    ),
    (
      WEDDING_ALBUM_LUXURY,
      "Wedding Album - Luxury Edition",
      "Handcrafted leather-bound wedding album",
      29900,
      "Albums",
      false,
    ),
    (
      DIGITAL_GALLERY,
      "Digital Gallery - Full Resolution",
      "Complete digital gallery with download rights",
      15000,
      "Digital",
      true,
    ),
    (
      CANVAS_PRINT_SET,
      "Canvas Print Set (3-piece)",
      "Gallery-wrapped canvas prints ready to hang",
      18000,
      "Canvas",
      false,
    ),
    (
      PORTRAIT_SESSION_PRINTS,
      "Portrait Session Prints",
      "Professional portrait prints in various sizes",
      3500,
      "Prints",
      false,
    ),
    (
      CUSTOM_PHOTO_BOOK,
      "Custom Photo Book",
      "Personalized photo book with your favorite memories",
      12000,
      "Books",
      false,
    ),
  ];

  rows
    .into_iter()
    .map(|(id, name, description, price_cents, category, is_digital)| Product {
      id,
      name: name.to_string(),
      description: Some(description.to_string()),
      price_cents,
      image_url: Some(format!("/images/shop/{}.jpg", id.simple())),
      category: category.to_string(),
      is_digital,
    })
    .collect()
}

/// Resolves a user-supplied category filter. `None`, empty and "All" mean no filter.
pub fn normalize_category(category: Option<&str>) -> ShopResult<Option<&'static str>> {
  let Some(raw) = category.map(str::trim).filter(|c| !c.is_empty()) else {
    return Ok(None);
  };
  if raw.eq_ignore_ascii_case(ALL_CATEGORIES) {
    return Ok(None);
  }
  CATEGORIES
    .iter()
    .find(|c| c.eq_ignore_ascii_case(raw))
    .map(|c| Some(*c))
    .ok_or_else(|| ShopError::Validation(format!("Unknown product category '{}'.", raw)))
}

pub struct Catalog {
  store: Arc<dyn ShopStore>,
}

impl Catalog {
  pub fn new(store: Arc<dyn ShopStore>) -> Self {
    Self { store }
  }

  #[instrument(name = "catalog::list", skip(self))]
  pub async fn list(&self, category: Option<&str>) -> ShopResult<Vec<Product>> {
    let filter = normalize_category(category)?;
    let products = self.store.list_products(filter).await?;
    info!(count = products.len(), category = filter.unwrap_or(ALL_CATEGORIES), "Products listed.");
    Ok(products)
  }

  pub async fn get(&self, product_id: Uuid) -> ShopResult<Product> {
    self
      .store
      .get_product(product_id)
      .await?
      .ok_or_else(|| ShopError::not_found("Product", product_id))
  }
}
