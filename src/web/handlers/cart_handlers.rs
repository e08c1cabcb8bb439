use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::cart::{cookie, service, CartStore, MemoryCart, RedisCartStore};
use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::views;
use crate::web::extractors::MaybeUser;

/// The request's cart, whichever backend owns it. Selection happens
/// exactly once, here; every handler below only sees the trait.
pub enum RequestCart {
  Server(RedisCartStore),
  Anonymous(MemoryCart),
}

impl RequestCart {
  pub fn bind(state: &AppState, user: Option<Uuid>, req: &HttpRequest) -> Self {
    match user {
      Some(user_id) => RequestCart::Server(RedisCartStore::for_user(state.redis.clone(), user_id)),
      None => {
        let raw = req
          .cookie(&state.config.cart_cookie_name)
          .map(|c| c.value().to_string());
        RequestCart::Anonymous(MemoryCart::new(cookie::decode_or_empty(raw.as_deref())))
      }
    }
  }

  pub fn store(&self) -> &dyn CartStore {
    match self {
      RequestCart::Server(s) => s,
      RequestCart::Anonymous(m) => m,
    }
  }

  /// Anonymous carts live in the client cookie, so every mutation has
  /// to be written back onto the response.
  pub fn updated_cookie(&self, name: &str) -> Option<Cookie<'static>> {
    match self {
      RequestCart::Server(_) => None,
      RequestCart::Anonymous(m) => Some(
        Cookie::build(name.to_string(), cookie::encode(&m.snapshot()))
          .path("/")
          .finish(),
      ),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct CartLinePayload {
  pub variant_id: Uuid,
  pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CartDeletePayload {
  pub variant_id: Uuid,
}

fn validate_quantity(quantity: i64) -> Result<u32> {
  u32::try_from(quantity)
    .ok()
    .filter(|q| *q > 0)
    .ok_or_else(|| AppError::InvalidQuantity(format!("invalid quantity {}", quantity)))
}

fn respond(cart: &RequestCart, cookie_name: &str, body: serde_json::Value) -> HttpResponse {
  let mut builder = HttpResponse::Ok();
  if let Some(cookie) = cart.updated_cookie(cookie_name) {
    builder.cookie(cookie);
  }
  builder.json(body)
}

#[instrument(skip(state, req, payload, user))]
pub async fn add_to_cart_handler(
  state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
  payload: web::Json<CartLinePayload>,
) -> Result<HttpResponse> {
  let quantity = validate_quantity(payload.quantity)?;
  let cart = RequestCart::bind(&state, user.0, &req);

  let cart_num = service::add_item(cart.store(), state.store.as_ref(), payload.variant_id, quantity).await?;

  Ok(respond(
    &cart,
    &state.config.cart_cookie_name,
    json!({"message": "Item added to cart.", "cartNum": cart_num}),
  ))
}

#[instrument(skip(state, req, payload, user))]
pub async fn update_cart_handler(
  state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
  payload: web::Json<CartLinePayload>,
) -> Result<HttpResponse> {
  let quantity = validate_quantity(payload.quantity)?;
  let cart = RequestCart::bind(&state, user.0, &req);

  let cart_num = service::update_item(cart.store(), state.store.as_ref(), payload.variant_id, quantity).await?;

  Ok(respond(
    &cart,
    &state.config.cart_cookie_name,
    json!({"message": "Cart updated.", "cartNum": cart_num}),
  ))
}

#[instrument(skip(state, req, payload, user))]
pub async fn delete_cart_handler(
  state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
  payload: web::Json<CartDeletePayload>,
) -> Result<HttpResponse> {
  let cart = RequestCart::bind(&state, user.0, &req);

  let cart_num = service::remove_item(cart.store(), state.store.as_ref(), payload.variant_id).await?;

  Ok(respond(
    &cart,
    &state.config.cart_cookie_name,
    json!({"message": "Item removed from cart.", "cartNum": cart_num}),
  ))
}

#[instrument(skip(state, req, user))]
pub async fn cart_info_handler(
  state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
) -> Result<HttpResponse> {
  let cart = RequestCart::bind(&state, user.0, &req);
  let snapshot = cart.store().cart().await?;
  let view = views::cart_view(state.store.as_ref(), &snapshot).await?;
  Ok(HttpResponse::Ok().json(view))
}
