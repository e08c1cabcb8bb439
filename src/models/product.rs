use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A purchasable SKU: one size/package of a product with its own price
/// and stock. `stock` and `sales` are mutated only by the checkout
/// engine, through a compare-and-set update; neither ever goes negative.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductVariant {
  pub id: Uuid,
  pub category_id: Uuid,
  pub name: String,
  pub price_cents: i64,
  pub stock: i32,
  pub sales: i32,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
  pub id: Uuid,
  pub name: String,
}

/// Landing-page carousel entry, ordered by `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GoodsBanner {
  pub id: Uuid,
  pub variant_id: Uuid,
  pub image_url: String,
  pub index: i32,
}

/// Landing-page promotion slot, ordered by `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PromotionBanner {
  pub id: Uuid,
  pub name: String,
  pub url: String,
  pub image_url: String,
  pub index: i32,
}
