//! Request identity extractors.
//!
//! Authentication mechanics are out of scope here; identity arrives as
//! an `X-User-ID` header the fronting session layer is trusted to set.

use actix_web::{FromRequest, HttpRequest};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

fn user_id_from_headers(req: &HttpRequest) -> Option<Uuid> {
  req
    .headers()
    .get("X-User-ID")
    .and_then(|v| v.to_str().ok())
    .and_then(|s| Uuid::parse_str(s).ok())
}

/// Requires an authenticated caller.
#[derive(Debug)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    match user_id_from_headers(req) {
      Some(user_id) => futures_util::future::ready(Ok(AuthenticatedUser { user_id })),
      None => {
        warn!("AuthenticatedUser extractor: Missing or invalid X-User-ID header.");
        futures_util::future::ready(Err(AppError::Auth(
          "User authentication required. Missing or invalid X-User-ID header.".to_string(),
        )))
      }
    }
  }
}

/// Caller identity when anonymous access is allowed (cart and catalog
/// endpoints serve both).
#[derive(Debug)]
pub struct MaybeUser(pub Option<Uuid>);

impl FromRequest for MaybeUser {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    futures_util::future::ready(Ok(MaybeUser(user_id_from_headers(req))))
  }
}
