use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::cart::{cookie, reconcile, RedisCartStore};
use crate::errors::{AppError, Result};
use crate::services::tasks::Task;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct SigninPayload {
  /// Idempotency token for the cart merge; a retried sign-in request
  /// must resend the same token.
  pub merge_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
  pub username: String,
  pub email: String,
}

/// Post-authentication hook: merge the anonymous cookie cart into the
/// user's server cart, then clear the cookie. The session mechanics
/// themselves live in the fronting auth layer.
#[instrument(skip(state, req, payload, auth), fields(user_id = %auth.user_id))]
pub async fn signin_handler(
  state: web::Data<AppState>,
  req: HttpRequest,
  auth: AuthenticatedUser,
  payload: web::Json<SigninPayload>,
) -> Result<HttpResponse> {
  let raw_cookie = req
    .cookie(&state.config.cart_cookie_name)
    .map(|c| c.value().to_string());
  let anonymous = cookie::decode_or_empty(raw_cookie.as_deref());
  let merge_token = payload
    .merge_token
    .clone()
    .unwrap_or_else(|| Uuid::new_v4().to_string());

  let server_cart = RedisCartStore::for_user(state.redis.clone(), auth.user_id);
  let merged = reconcile::merge_on_login(
    &server_cart,
    &anonymous,
    auth.user_id,
    &merge_token,
    state.merge_guard.as_ref(),
  )
  .await?;

  // The anonymous cart is consumed by the merge regardless of outcome.
  let mut removal = Cookie::build(state.config.cart_cookie_name.clone(), "").path("/").finish();
  removal.make_removal();

  Ok(
    HttpResponse::Ok()
      .cookie(removal)
      .json(json!({"message": "Signed in.", "cartNum": merged.total_quantity()})),
  )
}

/// Registration boundary: the account store lives elsewhere; this side
/// only queues the activation email.
#[instrument(skip(state, payload))]
pub async fn register_handler(state: web::Data<AppState>, payload: web::Json<RegisterPayload>) -> Result<HttpResponse> {
  if payload.username.trim().is_empty() || !payload.email.contains('@') {
    return Err(AppError::Validation("username and a valid email are required".to_string()));
  }

  let token = Uuid::new_v4().to_string();
  state
    .tasks
    .submit(Task::SendActivationEmail {
      to: payload.email.clone(),
      username: payload.username.clone(),
      token,
    })
    .await?;

  Ok(HttpResponse::Accepted().json(json!({"message": "Registered; activation email queued."})))
}
