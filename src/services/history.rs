//! Per-user recently-viewed history: a capped Redis list, most recent
//! first, one entry per variant.

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::errors::Result;

/// Entries kept per user.
const HISTORY_LIMIT: isize = 5;

#[async_trait]
pub trait RecentlyViewed: Send + Sync {
  /// Record a product-detail view, deduplicating and trimming.
  async fn record(&self, user_id: Uuid, variant_id: Uuid) -> Result<()>;

  /// Most recent first.
  async fn list(&self, user_id: Uuid) -> Result<Vec<Uuid>>;
}

pub struct RedisRecentlyViewed {
  conn: ConnectionManager,
}

impl RedisRecentlyViewed {
  pub fn new(conn: ConnectionManager) -> Self {
    Self { conn }
  }

  fn key(user_id: Uuid) -> String {
    format!("history:{}", user_id)
  }
}

#[async_trait]
impl RecentlyViewed for RedisRecentlyViewed {
  async fn record(&self, user_id: Uuid, variant_id: Uuid) -> Result<()> {
    let key = Self::key(user_id);
    let member = variant_id.to_string();
    // Remove-then-push keeps one entry per variant; trim caps the list.
    let mut pipe = redis::pipe();
    pipe
      .atomic()
      .lrem(&key, 0, &member)
      .ignore()
      .lpush(&key, &member)
      .ignore()
      .ltrim(&key, 0, HISTORY_LIMIT - 1)
      .ignore();
    let mut conn = self.conn.clone();
    let _: () = pipe.query_async(&mut conn).await?;
    Ok(())
  }

  async fn list(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
    let mut conn = self.conn.clone();
    let raw: Vec<String> = redis::cmd("LRANGE")
      .arg(Self::key(user_id))
      .arg(0)
      .arg(HISTORY_LIMIT - 1)
      .query_async(&mut conn)
      .await?;
    Ok(raw.iter().filter_map(|s| Uuid::parse_str(s).ok()).collect())
  }
}

/// In-process implementation for tests and redis-less development.
#[derive(Debug, Default)]
pub struct MemoryRecentlyViewed {
  entries: Mutex<std::collections::HashMap<Uuid, Vec<Uuid>>>,
}

#[async_trait]
impl RecentlyViewed for MemoryRecentlyViewed {
  async fn record(&self, user_id: Uuid, variant_id: Uuid) -> Result<()> {
    let mut guard = self.entries.lock();
    let list = guard.entry(user_id).or_default();
    list.retain(|id| *id != variant_id);
    list.insert(0, variant_id);
    list.truncate(HISTORY_LIMIT as usize);
    Ok(())
  }

  async fn list(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
    Ok(self.entries.lock().get(&user_id).cloned().unwrap_or_default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn history_deduplicates_and_caps_at_five() {
    let history = MemoryRecentlyViewed::default();
    let user = Uuid::new_v4();
    let variants: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();

    for v in &variants {
      history.record(user, *v).await.unwrap();
    }
    // Re-view the oldest surviving entry; it moves to the front.
    history.record(user, variants[3]).await.unwrap();

    let listed = history.list(user).await.unwrap();
    assert_eq!(listed.len(), 5);
    assert_eq!(listed[0], variants[3]);
    assert!(!listed.contains(&variants[0]));
    assert!(!listed.contains(&variants[1]));
  }
}
