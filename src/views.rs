//! Immutable view DTOs for the rendering collaborator.
//!
//! Derived display fields (line amounts, totals, status names) live on
//! these structs, built from the domain entities when a page needs
//! them. Nothing here is ever written back to a store.

use serde::Serialize;
use uuid::Uuid;

use crate::cart::Cart;
use crate::errors::Result;
use crate::models::{OrderHeader, OrderLine};
use crate::storage::StorefrontStore;

#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
  pub variant_id: Uuid,
  pub name: String,
  pub quantity: u32,
  pub unit_price_cents: i64,
  pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
  pub lines: Vec<CartLineView>,
  pub total_count: u64,
  pub total_goods_amount_cents: i64,
}

/// Build the cart page context. Lines whose variant has left the
/// catalog are skipped rather than failing the page.
pub async fn cart_view(store: &dyn StorefrontStore, cart: &Cart) -> Result<CartView> {
  let mut lines = Vec::with_capacity(cart.len());
  let mut total_count: u64 = 0;
  let mut total_goods_amount_cents: i64 = 0;

  for (variant_id, quantity) in cart.iter() {
    let Some(variant) = store.variant(variant_id).await? else {
      continue;
    };
    let amount_cents = i64::from(quantity) * variant.price_cents;
    total_count += u64::from(quantity);
    total_goods_amount_cents += amount_cents;
    lines.push(CartLineView {
      variant_id,
      name: variant.name,
      quantity,
      unit_price_cents: variant.price_cents,
      amount_cents,
    });
  }

  Ok(CartView {
    lines,
    total_count,
    total_goods_amount_cents,
  })
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLineView {
  pub variant_id: Uuid,
  pub name: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub amount_cents: i64,
  pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
  pub order_id: String,
  pub status: crate::models::OrderStatus,
  pub status_name: &'static str,
  pub pay_method_name: &'static str,
  pub total_count: i32,
  pub total_amount_cents: i64,
  pub shipping_cost_cents: i64,
  pub trade_id: Option<String>,
  pub created_at: chrono::DateTime<chrono::Utc>,
  pub lines: Vec<OrderLineView>,
}

pub async fn order_view(store: &dyn StorefrontStore, header: &OrderHeader, lines: &[OrderLine]) -> Result<OrderView> {
  let mut line_views = Vec::with_capacity(lines.len());
  for line in lines {
    let name = match store.variant(line.variant_id).await? {
      Some(variant) => variant.name,
      None => "(removed from catalog)".to_string(),
    };
    line_views.push(OrderLineView {
      variant_id: line.variant_id,
      name,
      quantity: line.quantity,
      unit_price_cents: line.unit_price_cents,
      amount_cents: line.amount_cents(),
      comment: line.comment.clone(),
    });
  }

  Ok(OrderView {
    order_id: header.order_id.clone(),
    status: header.status,
    status_name: header.status.display_name(),
    pay_method_name: header.pay_method.display_name(),
    total_count: header.total_count,
    total_amount_cents: header.total_amount_cents,
    shipping_cost_cents: header.shipping_cost_cents,
    trade_id: header.trade_id.clone(),
    created_at: header.created_at,
    lines: line_views,
  })
}
