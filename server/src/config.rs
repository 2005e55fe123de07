// darkroom_server/src/config.rs

use crate::errors::{AppError, Result};
use darkroom::{CheckoutConfig, SessionLimits};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Where the shop tables live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  /// In-process tables seeded with the catalog. Nothing survives a restart.
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "pg" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Required for the postgres backend only.
  pub database_url: Option<String>,
  pub app_base_url: String,
  pub store_backend: StoreBackend,

  pub shop_currency: String,
  pub checkout_hold: Duration,
  pub rollback_orphaned_orders: bool,

  pub session_max: usize,
  pub session_idle: Duration,

  // Startup chores for the postgres backend.
  pub seed_db: bool,
  pub ensure_schema: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    let config = Self::from_lookup(|name| env::var(name).ok())?;
    tracing::info!(backend = ?config.store_backend, "Application configuration loaded successfully.");
    Ok(config)
  }

  /// Builds the configuration from any variable source.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = get_or("SERVER_PORT", "8080")
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let app_base_url = lookup("APP_BASE_URL").unwrap_or_else(|| format!("http://{}:{}", server_host, server_port));
    let store_backend: StoreBackend = get_or("STORE_BACKEND", "postgres").parse()?;

    let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required by the postgres backend)".to_string(),
      ));
    }

    let shop_currency = get_or("SHOP_CURRENCY", "usd").trim().to_ascii_lowercase();
    if shop_currency.is_empty() {
      return Err(AppError::Config("SHOP_CURRENCY must not be empty".to_string()));
    }
    let hold_ms = get_or("CHECKOUT_HOLD_MS", "0")
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid CHECKOUT_HOLD_MS: {}", e)))?;
    let session_max = get_or("SESSION_MAX", "10000")
      .parse::<usize>()
      .ok()
      .filter(|max| *max > 0)
      .ok_or_else(|| AppError::Config("SESSION_MAX must be a positive number".to_string()))?;
    let session_idle_secs = get_or("SESSION_IDLE_SECS", "1800")
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid SESSION_IDLE_SECS: {}", e)))?;

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      store_backend,
      shop_currency,
      checkout_hold: Duration::from_millis(hold_ms),
      rollback_orphaned_orders: parse_flag(&lookup, "ROLLBACK_ORPHANED_ORDERS", true)?,
      session_max,
      session_idle: Duration::from_secs(session_idle_secs),
      seed_db: parse_flag(&lookup, "SEED_DB", false)?,
      ensure_schema: parse_flag(&lookup, "ENSURE_SCHEMA", false)?,
    })
  }

  pub fn checkout_config(&self) -> CheckoutConfig {
    CheckoutConfig {
      currency: self.shop_currency.clone(),
      payment_hold: self.checkout_hold,
      rollback_orphaned_orders: self.rollback_orphaned_orders,
    }
  }

  pub fn session_limits(&self) -> SessionLimits {
    SessionLimits {
      max_sessions: self.session_max,
      idle_timeout: self.session_idle,
    }
  }

  /// Absolute URL of a path on the shop front end.
  pub fn absolute_url(&self, path: &str) -> String {
    format!("{}{}", self.app_base_url.trim_end_matches('/'), path)
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_flag<F>(lookup: &F, name: &str, default: bool) -> Result<bool>
where
  F: Fn(&str) -> Option<String>,
{
  match lookup(name) {
    None => Ok(default),
    Some(raw) => raw
      .trim()
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid {} value: {}", name, e))),
  }
}
