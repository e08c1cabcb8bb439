use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

/// Fixed shipping cost per order: 10 currency units, in cents.
pub const SHIPPING_COST_CENTS: i64 = 1000;

/// Landing-page context cache TTL, seconds.
pub const LANDING_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub redis_url: String,
  pub app_base_url: String,

  /// Name of the anonymous cart cookie.
  pub cart_cookie_name: String,

  /// Maximum attempts for the optimistic stock decrement.
  pub stock_retry_limit: u32,
  /// Maximum polls of the payment gateway before giving up on one request.
  pub payment_poll_limit: u32,
  /// Delay between payment gateway polls, milliseconds.
  pub payment_poll_interval_ms: u64,

  /// Optional: seed the database with demo data on startup.
  pub seed_db: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let redis_url = get_env("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let cart_cookie_name = get_env("CART_COOKIE_NAME").unwrap_or_else(|_| "cart".to_string());

    let stock_retry_limit = get_env("STOCK_RETRY_LIMIT")
      .unwrap_or_else(|_| "3".to_string())
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid STOCK_RETRY_LIMIT: {}", e)))?;
    let payment_poll_limit = get_env("PAYMENT_POLL_LIMIT")
      .unwrap_or_else(|_| "5".to_string())
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid PAYMENT_POLL_LIMIT: {}", e)))?;
    let payment_poll_interval_ms = get_env("PAYMENT_POLL_INTERVAL_MS")
      .unwrap_or_else(|_| "500".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid PAYMENT_POLL_INTERVAL_MS: {}", e)))?;

    let seed_db = get_env("SEED_DB")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      redis_url,
      app_base_url,
      cart_cookie_name,
      stock_retry_limit,
      payment_poll_limit,
      payment_poll_interval_ms,
      seed_db,
    })
  }
}
