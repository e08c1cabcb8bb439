use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Shipping address. Referenced by orders by id; its lifecycle is
/// independent of any order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Address {
  pub id: Uuid,
  pub user_id: Uuid,
  pub recipient: String,
  pub phone: String,
  pub detail: String,
  pub zip_code: String,
  pub created_at: DateTime<Utc>,
}
