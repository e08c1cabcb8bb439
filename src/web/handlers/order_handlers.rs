use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::views;
use crate::web::extractors::AuthenticatedUser;

const ORDERS_PER_PAGE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
  pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CommentsPayload {
  /// variant id -> review text.
  pub comments: HashMap<Uuid, String>,
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn list_orders_handler(
  state: web::Data<AppState>,
  auth: AuthenticatedUser,
  query: web::Query<OrderListQuery>,
) -> Result<HttpResponse> {
  let page = query.page.unwrap_or(1).max(1);
  let offset = (page - 1) * ORDERS_PER_PAGE;

  let headers = state.store.orders_for_user(auth.user_id, ORDERS_PER_PAGE, offset).await?;
  let mut orders = Vec::with_capacity(headers.len());
  for header in &headers {
    let lines = state.store.order_lines(&header.order_id).await?;
    orders.push(views::order_view(state.store.as_ref(), header, &lines).await?);
  }

  Ok(HttpResponse::Ok().json(json!({"page": page, "orders": orders})))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn get_order_handler(
  state: web::Data<AppState>,
  auth: AuthenticatedUser,
  order_id: web::Path<String>,
) -> Result<HttpResponse> {
  let header = state
    .store
    .order(&order_id, auth.user_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("order {}", order_id)))?;
  let lines = state.store.order_lines(&header.order_id).await?;
  let view = views::order_view(state.store.as_ref(), &header, &lines).await?;
  Ok(HttpResponse::Ok().json(view))
}

/// Hand the order to the payment gateway; the client follows the URL.
#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn start_payment_handler(
  state: web::Data<AppState>,
  auth: AuthenticatedUser,
  order_id: web::Path<String>,
) -> Result<HttpResponse> {
  let url = state.orders.start_payment(auth.user_id, &order_id).await?;
  Ok(HttpResponse::Ok().json(json!({"message": "Payment created.", "url": url})))
}

/// Poll the gateway for the payment outcome (bounded server-side).
#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn check_payment_handler(
  state: web::Data<AppState>,
  auth: AuthenticatedUser,
  order_id: web::Path<String>,
) -> Result<HttpResponse> {
  let trade_id = state.orders.confirm_payment(auth.user_id, &order_id).await?;
  Ok(HttpResponse::Ok().json(json!({"message": "Payment confirmed.", "tradeId": trade_id})))
}

#[instrument(skip(state, auth, payload), fields(user_id = %auth.user_id))]
pub async fn submit_comments_handler(
  state: web::Data<AppState>,
  auth: AuthenticatedUser,
  order_id: web::Path<String>,
  payload: web::Json<CommentsPayload>,
) -> Result<HttpResponse> {
  let completed = state
    .orders
    .submit_comments(auth.user_id, &order_id, &payload.comments)
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": if completed { "Order completed." } else { "Comments recorded; some lines are still unreviewed." },
    "completed": completed,
  })))
}
