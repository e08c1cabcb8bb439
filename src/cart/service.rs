//! Cart operations shared by both backends.
//!
//! The stock comparisons here are a UX courtesy only: they stop the
//! obvious oversell at add time but guarantee nothing, since stock can
//! move between this check and checkout. The checkout engine re-validates
//! every quantity under its transaction.

use tracing::instrument;
use uuid::Uuid;

use crate::cart::CartStore;
use crate::errors::{AppError, Result};
use crate::models::ProductVariant;
use crate::storage::StorefrontStore;

async fn require_variant(catalog: &dyn StorefrontStore, variant_id: Uuid) -> Result<ProductVariant> {
  catalog
    .variant(variant_id)
    .await?
    .ok_or(AppError::VariantNotFound(variant_id))
}

fn check_stock(variant: &ProductVariant, requested: u32) -> Result<()> {
  if i64::from(requested) > i64::from(variant.stock) {
    return Err(AppError::InsufficientStock {
      variant_id: variant.id,
      requested,
      available: variant.stock,
    });
  }
  Ok(())
}

/// Additively put `delta` units of a variant into the cart. Returns the
/// cart's new total quantity for the badge in the page header.
#[instrument(skip(store, catalog), fields(%variant_id, delta))]
pub async fn add_item(
  store: &dyn CartStore,
  catalog: &dyn StorefrontStore,
  variant_id: Uuid,
  delta: u32,
) -> Result<u64> {
  if delta == 0 {
    return Err(AppError::InvalidQuantity("quantity must be at least 1".to_string()));
  }
  let variant = require_variant(catalog, variant_id).await?;
  check_stock(&variant, delta)?;

  let existing = store.cart().await?.quantity_of(variant_id).unwrap_or(0);
  let new_quantity = existing.saturating_add(delta);
  // Re-check with the prior contents folded in, so stacking adds
  // cannot walk past stock unnoticed.
  check_stock(&variant, new_quantity)?;

  store.set_line(variant_id, new_quantity).await?;
  store.total_quantity().await
}

/// Set a line to an exact quantity (the +/- and manual-entry flow).
#[instrument(skip(store, catalog), fields(%variant_id, quantity))]
pub async fn update_item(
  store: &dyn CartStore,
  catalog: &dyn StorefrontStore,
  variant_id: Uuid,
  quantity: u32,
) -> Result<u64> {
  if quantity == 0 {
    return Err(AppError::InvalidQuantity("quantity must be at least 1".to_string()));
  }
  let variant = require_variant(catalog, variant_id).await?;
  check_stock(&variant, quantity)?;

  store.set_line(variant_id, quantity).await?;
  store.total_quantity().await
}

/// Remove one line. The variant must still exist in the catalog, which
/// keeps the error distinguishable from "line was not in the cart".
#[instrument(skip(store, catalog), fields(%variant_id))]
pub async fn remove_item(store: &dyn CartStore, catalog: &dyn StorefrontStore, variant_id: Uuid) -> Result<u64> {
  require_variant(catalog, variant_id).await?;
  store.remove_line(variant_id).await?;
  store.total_quantity().await
}
