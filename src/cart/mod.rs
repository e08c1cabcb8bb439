//! Shopping cart: one logical contract over two physical backends.
//!
//! Authenticated users get a Redis-hash cart ([`RedisCartStore`]);
//! anonymous sessions get a cookie-serialized cart decoded into a
//! [`MemoryCart`] for the duration of the request. Business logic only
//! ever sees the [`CartStore`] trait and the [`Cart`] value type.

pub mod cookie;
pub mod memory;
pub mod reconcile;
pub mod redis_store;
pub mod service;

pub use memory::MemoryCart;
pub use redis_store::RedisCartStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, Result};

/// A cart: variant id -> positive quantity, unique keys, no order
/// significance. This is the single in-memory representation both
/// backends normalize to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
  lines: BTreeMap<Uuid, u32>,
}

impl Cart {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn quantity_of(&self, variant_id: Uuid) -> Option<u32> {
    self.lines.get(&variant_id).copied()
  }

  /// Set a line to an exact quantity. Zero is not a valid line
  /// quantity; use [`Cart::remove`] to drop a line.
  pub fn set(&mut self, variant_id: Uuid, quantity: u32) -> Result<()> {
    if quantity == 0 {
      return Err(AppError::InvalidQuantity("quantity must be at least 1".to_string()));
    }
    self.lines.insert(variant_id, quantity);
    Ok(())
  }

  /// Additively bump a line, returning the resulting quantity.
  pub fn add(&mut self, variant_id: Uuid, delta: u32) -> u32 {
    let entry = self.lines.entry(variant_id).or_insert(0);
    *entry = entry.saturating_add(delta);
    *entry
  }

  pub fn remove(&mut self, variant_id: Uuid) -> bool {
    self.lines.remove(&variant_id).is_some()
  }

  pub fn total_quantity(&self) -> u64 {
    self.lines.values().map(|q| u64::from(*q)).sum()
  }

  pub fn iter(&self) -> impl Iterator<Item = (Uuid, u32)> + '_ {
    self.lines.iter().map(|(id, q)| (*id, *q))
  }

  pub fn variant_ids(&self) -> Vec<Uuid> {
    self.lines.keys().copied().collect()
  }

  /// Additive merge used by the login reconciler: quantities of shared
  /// keys are summed, other lines are inserted as-is. No stock cap is
  /// applied here; checkout re-validates.
  pub fn merge(&mut self, other: &Cart) {
    for (variant_id, quantity) in other.iter() {
      self.add(variant_id, quantity);
    }
  }
}

impl FromIterator<(Uuid, u32)> for Cart {
  fn from_iter<I: IntoIterator<Item = (Uuid, u32)>>(iter: I) -> Self {
    Cart {
      lines: iter.into_iter().collect(),
    }
  }
}

/// One owner's cart, whichever backend holds it. Instances are bound to
/// their owner at construction time (a user id for the server store, a
/// request cookie for the anonymous store).
#[async_trait]
pub trait CartStore: Send + Sync {
  /// Snapshot the full cart.
  async fn cart(&self) -> Result<Cart>;

  /// Set one line to an exact quantity (at least 1).
  async fn set_line(&self, variant_id: Uuid, quantity: u32) -> Result<()>;

  /// Drop one line.
  async fn remove_line(&self, variant_id: Uuid) -> Result<()>;

  /// Drop several lines at once (post-checkout cleanup).
  async fn remove_lines(&self, variant_ids: &[Uuid]) -> Result<()>;

  /// Replace the whole cart in one bulk write (reconciliation).
  async fn replace(&self, cart: &Cart) -> Result<()>;

  /// Sum of all line quantities.
  async fn total_quantity(&self) -> Result<u64> {
    Ok(self.cart().await?.total_quantity())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn set_rejects_zero_quantity() {
    let mut cart = Cart::new();
    assert!(matches!(
      cart.set(Uuid::new_v4(), 0),
      Err(AppError::InvalidQuantity(_))
    ));
    assert!(cart.is_empty());
  }

  #[test]
  fn merge_is_additive_on_shared_keys() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut server: Cart = [(a, 2)].into_iter().collect();
    let anonymous: Cart = [(a, 3), (b, 1)].into_iter().collect();

    server.merge(&anonymous);

    assert_eq!(server.quantity_of(a), Some(5));
    assert_eq!(server.quantity_of(b), Some(1));
    assert_eq!(server.total_quantity(), 6);
  }
}
