use std::sync::Arc;
use std::time::Duration;

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::PgPool;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use freshmart::cart::reconcile::RedisMergeGuard;
use freshmart::checkout::CheckoutEngine;
use freshmart::config::AppConfig;
use freshmart::orders::OrderService;
use freshmart::services::history::RedisRecentlyViewed;
use freshmart::services::landing::RedisLandingCache;
use freshmart::services::payment::MockPaymentGateway;
use freshmart::services::tasks::LocalTaskQueue;
use freshmart::state::AppState;
use freshmart::storage::{PgStore, StorefrontStore};
use freshmart::web::configure_app_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting FreshMart storefront server...");

  let config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  let db_pool = match PgPool::connect(&config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      panic!("Database connection error: {}", e);
    }
  };

  let redis_client = match redis::Client::open(config.redis_url.as_str()) {
    Ok(client) => client,
    Err(e) => {
      tracing::error!(error = %e, "Invalid Redis URL.");
      panic!("Redis configuration error: {}", e);
    }
  };
  let redis_conn = match redis::aio::ConnectionManager::new(redis_client).await {
    Ok(conn) => {
      tracing::info!("Successfully connected to Redis.");
      conn
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to Redis.");
      panic!("Redis connection error: {}", e);
    }
  };

  let store: Arc<dyn StorefrontStore> = Arc::new(PgStore::new(db_pool));
  let gateway = Arc::new(MockPaymentGateway::new(config.app_base_url.clone()));
  let checkout = Arc::new(CheckoutEngine::new(store.clone(), config.stock_retry_limit));
  let orders = Arc::new(OrderService::new(
    store.clone(),
    gateway.clone(),
    config.payment_poll_limit,
    Duration::from_millis(config.payment_poll_interval_ms),
  ));
  let tasks = Arc::new(LocalTaskQueue::spawn(config.app_base_url.clone()));

  if config.seed_db {
    tracing::info!("Database seeding enabled; apply schema.sql and seed fixtures out of band.");
  }

  let app_state = AppState {
    store,
    redis: redis_conn.clone(),
    checkout,
    orders,
    gateway,
    tasks,
    landing_cache: Arc::new(RedisLandingCache::new(redis_conn.clone())),
    history: Arc::new(RedisRecentlyViewed::new(redis_conn.clone())),
    merge_guard: Arc::new(RedisMergeGuard::new(redis_conn)),
    config: config.clone(),
  };

  let server_address = format!("{}:{}", config.server_host, config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
