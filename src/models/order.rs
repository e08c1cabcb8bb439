use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

/// Order state machine:
///
/// `AwaitingPayment -> AwaitingShipment -> AwaitingReceipt ->
/// AwaitingReview -> Completed`
///
/// There is no cancellation state; an order whose payment never
/// confirms simply stays in `AwaitingPayment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  AwaitingPayment,
  AwaitingShipment,
  AwaitingReceipt,
  AwaitingReview,
  Completed,
}

impl OrderStatus {
  /// Whether `next` is a legal successor of `self`. Every status write
  /// goes through this table.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (AwaitingPayment, AwaitingShipment)
        | (AwaitingShipment, AwaitingReceipt)
        | (AwaitingReceipt, AwaitingReview)
        | (AwaitingReview, Completed)
    )
  }

  /// Human-readable name, for view construction only.
  pub fn display_name(self) -> &'static str {
    match self {
      OrderStatus::AwaitingPayment => "awaiting payment",
      OrderStatus::AwaitingShipment => "awaiting shipment",
      OrderStatus::AwaitingReceipt => "awaiting receipt",
      OrderStatus::AwaitingReview => "awaiting review",
      OrderStatus::Completed => "completed",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "pay_method_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayMethod {
  CashOnDelivery,
  Online,
}

impl PayMethod {
  pub fn display_name(self) -> &'static str {
    match self {
      PayMethod::CashOnDelivery => "cash on delivery",
      PayMethod::Online => "online payment",
    }
  }
}

impl std::str::FromStr for PayMethod {
  type Err = crate::errors::AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "cash_on_delivery" => Ok(PayMethod::CashOnDelivery),
      "online" => Ok(PayMethod::Online),
      other => Err(crate::errors::AppError::InvalidPayMethod(other.to_string())),
    }
  }
}

/// One committed checkout. Immutable after finalization except for
/// `status` and `trade_id`; the totals are captured at creation time and
/// never re-derived.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderHeader {
  /// Time + user derived id, e.g. `20260831093015123456<user-id>`.
  /// Globally unique, enforced by the primary key; collisions are
  /// retried at allocation time.
  pub order_id: String,
  pub user_id: Uuid,
  pub address_id: Uuid,
  pub total_count: i32,
  pub total_amount_cents: i64,
  pub shipping_cost_cents: i64,
  pub pay_method: PayMethod,
  pub status: OrderStatus,
  /// Gateway-side transaction id, set once payment is confirmed.
  pub trade_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl OrderHeader {
  /// Allocate a fresh order id for `user_id` from the current clock,
  /// down to microseconds so a retried allocation gets a genuinely new
  /// id. Uniqueness is still NOT guaranteed here; the store's primary
  /// key rejects the residual collision and the checkout engine
  /// retries.
  pub fn allocate_id(user_id: Uuid, now: DateTime<Utc>) -> String {
    format!("{}{}", now.format("%Y%m%d%H%M%S%6f"), user_id.simple())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transition_table_accepts_the_forward_chain() {
    use OrderStatus::*;
    assert!(AwaitingPayment.can_transition_to(AwaitingShipment));
    assert!(AwaitingShipment.can_transition_to(AwaitingReceipt));
    assert!(AwaitingReceipt.can_transition_to(AwaitingReview));
    assert!(AwaitingReview.can_transition_to(Completed));
  }

  #[test]
  fn transition_table_rejects_skips_and_reversals() {
    use OrderStatus::*;
    assert!(!AwaitingPayment.can_transition_to(AwaitingReview));
    assert!(!AwaitingPayment.can_transition_to(Completed));
    assert!(!AwaitingShipment.can_transition_to(AwaitingPayment));
    assert!(!Completed.can_transition_to(AwaitingReview));
    assert!(!AwaitingReview.can_transition_to(AwaitingReview));
  }

  #[test]
  fn allocated_ids_embed_timestamp_and_user() {
    let user = Uuid::new_v4();
    let now = chrono::Utc::now();
    let id = OrderHeader::allocate_id(user, now);
    assert!(id.starts_with(&now.format("%Y%m%d%H%M%S").to_string()));
    assert!(id.ends_with(&user.simple().to_string()));
  }

  #[test]
  fn ids_allocated_within_one_second_differ() {
    use chrono::{Duration, TimeZone};
    let user = Uuid::new_v4();
    let base = chrono::Utc.with_ymd_and_hms(2026, 8, 31, 9, 30, 15).unwrap();
    let first = OrderHeader::allocate_id(user, base);
    let second = OrderHeader::allocate_id(user, base + Duration::microseconds(1));
    assert_ne!(first, second);
  }
}
