// darkroom_server/src/db/mod.rs

pub mod pg_store;
pub mod rows;

pub use pg_store::PgShopStore;

use darkroom::catalog::seed_products;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, instrument};

const SHOP_SCHEMA: &str = include_str!("../../migrations/0001_shop_schema.sql");

pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
  PgPoolOptions::new().max_connections(10).connect(database_url).await
}

/// Creates the shop tables when they do not exist yet.
#[instrument(name = "db::ensure_schema", skip(pool))]
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
  sqlx::raw_sql(SHOP_SCHEMA).execute(pool).await?;
  info!("Shop schema is in place.");
  Ok(())
}

/// Upserts the studio catalog, refreshing rows that already exist.
#[instrument(name = "db::seed_catalog", skip(pool))]
pub async fn seed_catalog(pool: &PgPool) -> Result<usize, sqlx::Error> {
  let products = seed_products();
  let mut tx = pool.begin().await?;
  for product in &products {
    sqlx::query(
      r#"
      INSERT INTO products (id, name, description, price_cents, image_url, category, is_digital)
      VALUES ($1, $2, $3, $4, $5, $6, $7)
      ON CONFLICT (id) DO UPDATE SET
        name = EXCLUDED.name,
        description = EXCLUDED.description,
        price_cents = EXCLUDED.price_cents,
        image_url = EXCLUDED.image_url,
        category = EXCLUDED.category,
        is_digital = EXCLUDED.is_digital
      "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(&product.image_url)
    .bind(&product.category)
    .bind(product.is_digital)
    .execute(&mut *tx)
    .await?;
  }
  tx.commit().await?;
  info!(count = products.len(), "Catalog seeded.");
  Ok(products.len())
}
