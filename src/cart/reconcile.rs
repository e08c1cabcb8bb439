//! Login-time cart reconciliation.
//!
//! Merges the anonymous cookie cart into the authenticating user's
//! server cart: additive quantities on shared variants, plain insert
//! otherwise, then one bulk replace. The caller clears the cookie
//! afterwards regardless of what the server cart held.
//!
//! A retried sign-in request must not double-count quantities, so every
//! merge is keyed by a per-login token claimed through a [`MergeGuard`];
//! the second claim of the same token turns the merge into a no-op.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cart::{Cart, CartStore};
use crate::errors::Result;

/// At-most-once claim of a login merge token.
#[async_trait]
pub trait MergeGuard: Send + Sync {
  /// Returns true exactly once per `(user_id, token)` pair.
  async fn claim(&self, user_id: Uuid, token: &str) -> Result<bool>;
}

/// Redis-backed guard: `SET NX EX` on `cartmerge:{user}:{token}`, so
/// claims age out instead of accumulating forever.
pub struct RedisMergeGuard {
  conn: ConnectionManager,
  ttl_secs: u64,
}

impl RedisMergeGuard {
  pub fn new(conn: ConnectionManager) -> Self {
    Self {
      conn,
      ttl_secs: 24 * 3600,
    }
  }
}

#[async_trait]
impl MergeGuard for RedisMergeGuard {
  async fn claim(&self, user_id: Uuid, token: &str) -> Result<bool> {
    let key = format!("cartmerge:{}:{}", user_id, token);
    let mut conn = self.conn.clone();
    let reply: Option<String> = redis::cmd("SET")
      .arg(&key)
      .arg(1)
      .arg("NX")
      .arg("EX")
      .arg(self.ttl_secs)
      .query_async(&mut conn)
      .await?;
    Ok(reply.is_some())
  }
}

/// In-process guard for tests and single-node development.
#[derive(Debug, Default)]
pub struct MemoryMergeGuard {
  seen: Mutex<HashSet<(Uuid, String)>>,
}

#[async_trait]
impl MergeGuard for MemoryMergeGuard {
  async fn claim(&self, user_id: Uuid, token: &str) -> Result<bool> {
    Ok(self.seen.lock().insert((user_id, token.to_string())))
  }
}

/// Merge `anonymous` into the user's server cart. Returns the merged
/// cart (or the untouched server cart when the token was already
/// claimed, or when there was nothing to merge).
#[instrument(skip(server, anonymous, guard), fields(%user_id, token, anonymous_lines = anonymous.len()))]
pub async fn merge_on_login(
  server: &dyn CartStore,
  anonymous: &Cart,
  user_id: Uuid,
  token: &str,
  guard: &dyn MergeGuard,
) -> Result<Cart> {
  if anonymous.is_empty() {
    return server.cart().await;
  }

  if !guard.claim(user_id, token).await? {
    warn!("Merge token already claimed, skipping cart reconciliation");
    return server.cart().await;
  }

  let mut merged = server.cart().await?;
  merged.merge(anonymous);
  server.replace(&merged).await?;
  info!(merged_lines = merged.len(), "Anonymous cart merged into server cart");
  Ok(merged)
}
