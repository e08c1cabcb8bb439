use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::cart::{CartStore, RedisCartStore};
use crate::config::SHIPPING_COST_CENTS;
use crate::errors::{AppError, Result};
use crate::models::PayMethod;
use crate::state::AppState;
use crate::views;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderPayload {
  pub variant_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CommitOrderPayload {
  pub address_id: Uuid,
  pub pay_method: String,
  pub variant_ids: Vec<Uuid>,
}

/// Order-confirmation preview: the selected cart lines priced at
/// current catalog prices, plus the default address and shipping cost.
/// Nothing is written; the commit step re-derives everything.
#[instrument(skip(state, payload, auth), fields(user_id = %auth.user_id))]
pub async fn place_order_handler(
  state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<PlaceOrderPayload>,
) -> Result<HttpResponse> {
  if payload.variant_ids.is_empty() {
    return Err(AppError::Validation("no cart lines selected".to_string()));
  }

  let cart_store = RedisCartStore::for_user(state.redis.clone(), auth.user_id);
  let full_cart = cart_store.cart().await?;
  let selected: crate::cart::Cart = payload
    .variant_ids
    .iter()
    .filter_map(|id| full_cart.quantity_of(*id).map(|q| (*id, q)))
    .collect();

  let view = views::cart_view(state.store.as_ref(), &selected).await?;
  let address = state.store.latest_address(auth.user_id).await?;

  Ok(HttpResponse::Ok().json(json!({
    "lines": view.lines,
    "totalCount": view.total_count,
    "totalGoodsAmountCents": view.total_goods_amount_cents,
    "shippingCostCents": SHIPPING_COST_CENTS,
    "totalAmountCents": view.total_goods_amount_cents + SHIPPING_COST_CENTS,
    "address": address,
  })))
}

#[instrument(skip(state, payload, auth), fields(user_id = %auth.user_id))]
pub async fn commit_order_handler(
  state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<CommitOrderPayload>,
) -> Result<HttpResponse> {
  let pay_method: PayMethod = payload.pay_method.parse()?;
  let cart_store = RedisCartStore::for_user(state.redis.clone(), auth.user_id);

  let header = state
    .checkout
    .checkout(auth.user_id, payload.address_id, pay_method, &payload.variant_ids, &cart_store)
    .await?;

  Ok(HttpResponse::Created().json(json!({
    "message": "Order committed.",
    "orderId": header.order_id,
    "totalCount": header.total_count,
    "totalAmountCents": header.total_amount_cents,
    "status": header.status,
  })))
}
