//! Landing-page context cache.
//!
//! One named cache entry holds the landing context (categories plus
//! banner sets) as a JSON snapshot with a fixed TTL. Every catalog
//! write goes through [`catalog_written`], which drops the entry and
//! queues the static-page regeneration job, so readers only ever see
//! the entry expire or disappear, never go stale silently.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::LANDING_CACHE_TTL_SECS;
use crate::errors::Result;
use crate::models::{Category, GoodsBanner, PromotionBanner};
use crate::services::tasks::{Task, TaskDispatcher};
use crate::storage::StorefrontStore;

const CACHE_KEY: &str = "landing:context";

/// Everything the landing page renders, data only. The rendering
/// collaborator turns this into markup; the core never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandingContext {
  pub categories: Vec<Category>,
  pub goods_banners: Vec<GoodsBanner>,
  pub promotion_banners: Vec<PromotionBanner>,
}

#[async_trait]
pub trait LandingCache: Send + Sync {
  async fn get(&self) -> Result<Option<LandingContext>>;
  async fn put(&self, context: &LandingContext) -> Result<()>;
  async fn invalidate(&self) -> Result<()>;
}

pub struct RedisLandingCache {
  conn: ConnectionManager,
  ttl_secs: u64,
}

impl RedisLandingCache {
  pub fn new(conn: ConnectionManager) -> Self {
    Self {
      conn,
      ttl_secs: LANDING_CACHE_TTL_SECS,
    }
  }
}

#[async_trait]
impl LandingCache for RedisLandingCache {
  async fn get(&self) -> Result<Option<LandingContext>> {
    let mut conn = self.conn.clone();
    let raw: Option<String> = conn.get(CACHE_KEY).await?;
    match raw {
      None => Ok(None),
      Some(json) => match serde_json::from_str(&json) {
        Ok(context) => Ok(Some(context)),
        Err(e) => {
          // A snapshot from an older build; treat as a miss.
          warn!(error = %e, "Discarding undecodable landing cache entry");
          Ok(None)
        }
      },
    }
  }

  async fn put(&self, context: &LandingContext) -> Result<()> {
    let json = serde_json::to_string(context)
      .map_err(|e| crate::errors::AppError::Internal(format!("landing context serialization: {}", e)))?;
    let mut conn = self.conn.clone();
    let _: () = conn.set_ex(CACHE_KEY, json, self.ttl_secs).await?;
    Ok(())
  }

  async fn invalidate(&self) -> Result<()> {
    let mut conn = self.conn.clone();
    let _: () = conn.del(CACHE_KEY).await?;
    Ok(())
  }
}

/// In-process cache with the same TTL semantics, for tests and
/// redis-less development.
#[derive(Debug, Default)]
pub struct MemoryLandingCache {
  entry: Mutex<Option<(LandingContext, DateTime<Utc>)>>,
}

#[async_trait]
impl LandingCache for MemoryLandingCache {
  async fn get(&self) -> Result<Option<LandingContext>> {
    let guard = self.entry.lock();
    Ok(match &*guard {
      Some((context, expires_at)) if *expires_at > Utc::now() => Some(context.clone()),
      _ => None,
    })
  }

  async fn put(&self, context: &LandingContext) -> Result<()> {
    let expires_at = Utc::now() + Duration::seconds(LANDING_CACHE_TTL_SECS as i64);
    *self.entry.lock() = Some((context.clone(), expires_at));
    Ok(())
  }

  async fn invalidate(&self) -> Result<()> {
    *self.entry.lock() = None;
    Ok(())
  }
}

/// Read-through load of the landing context.
#[instrument(skip_all)]
pub async fn landing_context(store: &dyn StorefrontStore, cache: &dyn LandingCache) -> Result<LandingContext> {
  if let Some(context) = cache.get().await? {
    debug!("Landing context served from cache");
    return Ok(context);
  }

  let context = LandingContext {
    categories: store.categories().await?,
    goods_banners: store.goods_banners().await?,
    promotion_banners: store.promotion_banners().await?,
  };
  cache.put(&context).await?;
  info!("Landing context rebuilt and cached");
  Ok(context)
}

/// Invalidation hook invoked by every mutating operation on the catalog
/// entities: drop the cache entry and queue the static-page rebuild.
pub async fn catalog_written(cache: &dyn LandingCache, tasks: &Arc<dyn TaskDispatcher>) -> Result<()> {
  cache.invalidate().await?;
  tasks.submit(Task::RegenerateLandingPage).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::tasks::RecordingTaskDispatcher;
  use crate::storage::MemoryStore;
  use uuid::Uuid;

  #[tokio::test]
  async fn landing_context_is_loaded_once_and_then_served_from_cache() {
    let store = MemoryStore::new();
    store
      .insert_category(Category {
        id: Uuid::new_v4(),
        name: "fruit".to_string(),
      })
      .await;
    let cache = MemoryLandingCache::default();

    let first = landing_context(&store, &cache).await.unwrap();
    assert_eq!(first.categories.len(), 1);

    // A catalog write after the load is invisible until invalidation.
    store
      .insert_category(Category {
        id: Uuid::new_v4(),
        name: "dairy".to_string(),
      })
      .await;
    let cached = landing_context(&store, &cache).await.unwrap();
    assert_eq!(cached, first);
  }

  #[tokio::test]
  async fn catalog_writes_drop_the_cache_and_queue_the_rebuild() {
    let store = MemoryStore::new();
    let cache = MemoryLandingCache::default();
    let recorder = Arc::new(RecordingTaskDispatcher::default());
    let tasks: Arc<dyn TaskDispatcher> = recorder.clone();

    landing_context(&store, &cache).await.unwrap();
    assert!(cache.get().await.unwrap().is_some());

    catalog_written(&cache, &tasks).await.unwrap();
    assert!(cache.get().await.unwrap().is_none());
    assert_eq!(recorder.submitted(), vec![Task::RegenerateLandingPage]);
  }
}
