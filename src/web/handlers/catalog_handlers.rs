use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::services::landing;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, MaybeUser};
use crate::web::handlers::cart_handlers::RequestCart;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
  pub sort: Option<String>,
}

/// Landing page context: cached catalog data plus the caller's live
/// cart badge (the badge is per-caller and never cached).
#[instrument(skip(state, req, user))]
pub async fn index_handler(
  state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
) -> Result<HttpResponse> {
  let context = landing::landing_context(state.store.as_ref(), state.landing_cache.as_ref()).await?;
  let cart = RequestCart::bind(&state, user.0, &req);
  let cart_num = cart.store().total_quantity().await?;

  Ok(HttpResponse::Ok().json(json!({
    "categories": context.categories,
    "goodsBanners": context.goods_banners,
    "promotionBanners": context.promotion_banners,
    "cartNum": cart_num,
  })))
}

#[instrument(skip(state, req, user))]
pub async fn product_detail_handler(
  state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
  variant_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let variant_id = *variant_id;
  let variant = state
    .store
    .variant(variant_id)
    .await?
    .ok_or(AppError::VariantNotFound(variant_id))?;
  let others = state.store.variants_in_category(variant.category_id).await?;
  let new_arrivals: Vec<_> = others.iter().filter(|v| v.id != variant_id).take(2).cloned().collect();

  if let Some(user_id) = user.0 {
    // Browsing history is a convenience; never fail the page over it.
    if let Err(e) = state.history.record(user_id, variant_id).await {
      warn!(error = %e, "Failed to record browsing history");
    }
  }

  let cart = RequestCart::bind(&state, user.0, &req);
  let cart_num = cart.store().total_quantity().await?;

  Ok(HttpResponse::Ok().json(json!({
    "variant": variant,
    "newArrivals": new_arrivals,
    "cartNum": cart_num,
  })))
}

/// Invalidation hook for catalog writes that happen out of band
/// (seeding, back-office imports): drop the landing cache entry and
/// queue the static-page rebuild.
#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn catalog_refresh_handler(state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse> {
  landing::catalog_written(state.landing_cache.as_ref(), &state.tasks).await?;
  Ok(HttpResponse::Accepted().json(json!({"message": "Landing cache invalidated; rebuild queued."})))
}

/// User-center view of recently browsed products, most recent first.
#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn browsing_history_handler(state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse> {
  let ids = state.history.list(auth.user_id).await?;
  let mut variants = Vec::with_capacity(ids.len());
  for id in ids {
    // Entries whose variant has left the catalog silently drop out.
    if let Some(variant) = state.store.variant(id).await? {
      variants.push(variant);
    }
  }
  Ok(HttpResponse::Ok().json(json!({"recentlyViewed": variants})))
}

#[instrument(skip(state, req, user, query))]
pub async fn category_list_handler(
  state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
  category_id: web::Path<Uuid>,
  query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
  let mut variants = state.store.variants_in_category(*category_id).await?;
  let sort = match query.sort.as_deref() {
    Some("price") => {
      variants.sort_by_key(|v| v.price_cents);
      "price"
    }
    Some("hot") => {
      variants.sort_by(|a, b| b.sales.cmp(&a.sales));
      "hot"
    }
    // Default ordering is newest first, as the store returns it.
    _ => "default",
  };

  let cart = RequestCart::bind(&state, user.0, &req);
  let cart_num = cart.store().total_quantity().await?;

  Ok(HttpResponse::Ok().json(json!({
    "categoryId": *category_id,
    "sort": sort,
    "variants": variants,
    "cartNum": cart_num,
  })))
}
