use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One line of a committed order. `unit_price_cents` is the variant's
/// price at purchase time; later catalog price changes never alter it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderLine {
  pub order_id: String,
  pub variant_id: Uuid,
  pub quantity: i32,
  pub unit_price_cents: i64,
  /// Review text, set after delivery; `None` until the buyer comments.
  pub comment: Option<String>,
}

impl OrderLine {
  pub fn amount_cents(&self) -> i64 {
    i64::from(self.quantity) * self.unit_price_cents
  }
}
