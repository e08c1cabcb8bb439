//! Redis-backed server cart for authenticated users.
//!
//! One Redis hash per user, `cart:{user_id}`, field = variant id,
//! value = quantity. Redis hands hash values back as byte strings;
//! every value is decoded to `u32` before any arithmetic so the two
//! cart backends are indistinguishable above this module.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::cart::{Cart, CartStore};
use crate::errors::{AppError, Result};

pub struct RedisCartStore {
  conn: ConnectionManager,
  key: String,
}

impl RedisCartStore {
  pub fn for_user(conn: ConnectionManager, user_id: Uuid) -> Self {
    Self {
      conn,
      key: format!("cart:{}", user_id),
    }
  }
}

/// Decode one Redis hash value into a quantity. Non-numeric or negative
/// payloads fail with `InvalidQuantity`.
pub(crate) fn parse_quantity(raw: &[u8]) -> Result<u32> {
  let text = std::str::from_utf8(raw).map_err(|_| AppError::InvalidQuantity("non-UTF-8 cart quantity".to_string()))?;
  text
    .trim()
    .parse::<u32>()
    .map_err(|_| AppError::InvalidQuantity(format!("non-numeric or negative cart quantity: {:?}", text)))
}

#[async_trait]
impl CartStore for RedisCartStore {
  async fn cart(&self) -> Result<Cart> {
    let mut conn = self.conn.clone();
    let raw: HashMap<String, Vec<u8>> = conn.hgetall(&self.key).await?;

    let mut cart = Cart::new();
    for (field, value) in &raw {
      let variant_id = Uuid::parse_str(field)
        .map_err(|_| AppError::Internal(format!("corrupt cart entry key {:?} in {}", field, self.key)))?;
      cart.set(variant_id, parse_quantity(value)?)?;
    }
    Ok(cart)
  }

  async fn set_line(&self, variant_id: Uuid, quantity: u32) -> Result<()> {
    if quantity == 0 {
      return Err(AppError::InvalidQuantity("quantity must be at least 1".to_string()));
    }
    let mut conn = self.conn.clone();
    let _: () = conn.hset(&self.key, variant_id.to_string(), quantity).await?;
    Ok(())
  }

  async fn remove_line(&self, variant_id: Uuid) -> Result<()> {
    let mut conn = self.conn.clone();
    let _: () = conn.hdel(&self.key, variant_id.to_string()).await?;
    Ok(())
  }

  async fn remove_lines(&self, variant_ids: &[Uuid]) -> Result<()> {
    if variant_ids.is_empty() {
      return Ok(());
    }
    let fields: Vec<String> = variant_ids.iter().map(Uuid::to_string).collect();
    let mut conn = self.conn.clone();
    let _: () = conn.hdel(&self.key, fields).await?;
    Ok(())
  }

  async fn replace(&self, cart: &Cart) -> Result<()> {
    // Delete-then-write in one atomic pipeline so a concurrent reader
    // never observes a half-replaced cart.
    let mut pipe = redis::pipe();
    pipe.atomic().del(&self.key).ignore();
    for (variant_id, quantity) in cart.iter() {
      pipe.hset(&self.key, variant_id.to_string(), quantity).ignore();
    }
    let mut conn = self.conn.clone();
    let _: () = pipe.query_async(&mut conn).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::parse_quantity;

  #[test]
  fn byte_string_quantities_decode_to_integers() {
    assert_eq!(parse_quantity(b"7").unwrap(), 7);
    assert_eq!(parse_quantity(b" 12 ").unwrap(), 12);
  }

  #[test]
  fn non_numeric_and_negative_quantities_are_invalid() {
    assert!(parse_quantity(b"seven").is_err());
    assert!(parse_quantity(b"-3").is_err());
    assert!(parse_quantity(b"").is_err());
    assert!(parse_quantity(&[0xff, 0xfe]).is_err());
  }
}
