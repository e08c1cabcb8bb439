use std::sync::Arc;

use redis::aio::ConnectionManager;

use crate::cart::reconcile::MergeGuard;
use crate::checkout::CheckoutEngine;
use crate::config::AppConfig;
use crate::orders::OrderService;
use crate::services::history::RecentlyViewed;
use crate::services::landing::LandingCache;
use crate::services::payment::PaymentGateway;
use crate::services::tasks::TaskDispatcher;
use crate::storage::StorefrontStore;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn StorefrontStore>,
  /// Shared Redis connection; per-user cart stores are built from it.
  pub redis: ConnectionManager,
  pub checkout: Arc<CheckoutEngine>,
  pub orders: Arc<OrderService>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub tasks: Arc<dyn TaskDispatcher>,
  pub landing_cache: Arc<dyn LandingCache>,
  pub history: Arc<dyn RecentlyViewed>,
  pub merge_guard: Arc<dyn MergeGuard>,
  pub config: Arc<AppConfig>,
}
