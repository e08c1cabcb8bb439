//! Cookie serialization of the anonymous cart.
//!
//! Wire format: a flat UTF-8 JSON object, string variant-id keys,
//! integer quantity values, no nesting. The round-trip is exact:
//! `decode(&encode(cart)) == cart` for any valid cart.

use crate::cart::Cart;
use crate::errors::{AppError, Result};

pub fn encode(cart: &Cart) -> String {
  // A map of Uuid -> u32 cannot fail JSON serialization.
  serde_json::to_string(cart).unwrap_or_else(|_| "{}".to_string())
}

pub fn decode(raw: &str) -> Result<Cart> {
  let cart: Cart =
    serde_json::from_str(raw).map_err(|e| AppError::InvalidQuantity(format!("malformed cart cookie: {}", e)))?;
  // Serde only enforces the integer type; the at-least-1 rule every
  // other write path goes through still has to hold here.
  if let Some((variant_id, _)) = cart.iter().find(|(_, quantity)| *quantity == 0) {
    return Err(AppError::InvalidQuantity(format!(
      "zero quantity for variant {} in cart cookie",
      variant_id
    )));
  }
  Ok(cart)
}

/// Decode a request cookie that may be absent or malformed. An absent
/// cookie is an empty cart; a malformed one is discarded with a warning
/// rather than failing the request.
pub fn decode_or_empty(raw: Option<&str>) -> Cart {
  match raw {
    None => Cart::new(),
    Some(value) => match decode(value) {
      Ok(cart) => cart,
      Err(e) => {
        tracing::warn!(error = %e, "Discarding malformed cart cookie");
        Cart::new()
      }
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  #[test]
  fn round_trip_is_exact() {
    let cart: Cart = [(Uuid::new_v4(), 3), (Uuid::new_v4(), 1), (Uuid::new_v4(), 250)]
      .into_iter()
      .collect();
    assert_eq!(decode(&encode(&cart)).unwrap(), cart);

    let empty = Cart::new();
    assert_eq!(decode(&encode(&empty)).unwrap(), empty);
  }

  #[test]
  fn encoding_is_a_flat_string_keyed_object() {
    let id = Uuid::new_v4();
    let cart: Cart = [(id, 2)].into_iter().collect();
    let json: serde_json::Value = serde_json::from_str(&encode(&cart)).unwrap();
    assert_eq!(json[id.to_string()], serde_json::json!(2));
  }

  #[test]
  fn negative_and_non_numeric_quantities_are_rejected() {
    assert!(decode(&format!("{{\"{}\": -1}}", Uuid::new_v4())).is_err());
    assert!(decode(&format!("{{\"{}\": \"two\"}}", Uuid::new_v4())).is_err());
  }

  #[test]
  fn zero_quantities_are_rejected() {
    // A crafted cookie must not smuggle a zero-quantity line past the
    // at-least-1 rule; it is discarded like any other malformed cookie.
    let raw = format!("{{\"{}\": 0}}", Uuid::new_v4());
    assert!(matches!(decode(&raw), Err(AppError::InvalidQuantity(_))));
    assert!(decode_or_empty(Some(&raw)).is_empty());
  }

  #[test]
  fn absent_or_malformed_cookie_yields_empty_cart() {
    assert!(decode_or_empty(None).is_empty());
    assert!(decode_or_empty(Some("not json")).is_empty());
  }
}
