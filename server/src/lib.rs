// darkroom_server/src/lib.rs

//! HTTP surface of the darkroom shop: catalog, cart, checkout and order review over actix-web.

pub mod config;
pub mod db;
pub mod errors;
pub mod state;
pub mod web;

use crate::config::{AppConfig, StoreBackend};
use crate::errors::{AppError, Result};
use darkroom::{MemoryStore, ShopStore};
use std::sync::Arc;
use tracing::info;

/// Opens the configured table store, running the schema and seed chores first when asked.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn ShopStore>> {
  match config.store_backend {
    StoreBackend::Memory => {
      info!("Using the in-memory store with the seeded catalog.");
      Ok(Arc::new(MemoryStore::seeded()))
    }
    StoreBackend::Postgres => {
      let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
      let pool = db::connect(database_url).await?;
      info!("Successfully connected to the database.");
      if config.ensure_schema {
        db::ensure_schema(&pool).await?;
      }
      if config.seed_db {
        db::seed_catalog(&pool).await?;
      }
      Ok(Arc::new(db::PgShopStore::new(pool)))
    }
  }
}
