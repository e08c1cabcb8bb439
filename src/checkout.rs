//! Checkout engine: converts cart lines into a committed order.
//!
//! Everything between inserting the provisional header and finalizing
//! the totals runs inside one [`CheckoutTx`]; any error path simply
//! drops the transaction and no partial order or stock movement ever
//! becomes visible. Cart cleanup happens after commit and is allowed to
//! fail, because a stale cart line is a nuisance, not a correctness
//! problem: the next checkout re-validates stock anyway.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cart::CartStore;
use crate::config::SHIPPING_COST_CENTS;
use crate::errors::{AppError, Result};
use crate::models::{OrderHeader, OrderLine, OrderStatus, PayMethod};
use crate::storage::StorefrontStore;

pub struct CheckoutEngine {
  store: Arc<dyn StorefrontStore>,
  shipping_cost_cents: i64,
  /// Attempts per line for the optimistic stock decrement.
  stock_retry_limit: u32,
  /// Attempts at allocating a unique order id.
  id_allocation_limit: u32,
}

impl CheckoutEngine {
  pub fn new(store: Arc<dyn StorefrontStore>, stock_retry_limit: u32) -> Self {
    Self {
      store,
      shipping_cost_cents: SHIPPING_COST_CENTS,
      stock_retry_limit: stock_retry_limit.max(1),
      id_allocation_limit: 3,
    }
  }

  /// Commit the selected cart lines as one order.
  ///
  /// Requested quantities are read from the user's server cart, never
  /// from the caller, so a tampered request cannot inflate an order
  /// past what the cart holds.
  #[instrument(skip(self, cart, variant_ids), fields(%user_id, %address_id, lines = variant_ids.len()))]
  pub async fn checkout(
    &self,
    user_id: Uuid,
    address_id: Uuid,
    pay_method: PayMethod,
    variant_ids: &[Uuid],
    cart: &dyn CartStore,
  ) -> Result<OrderHeader> {
    // Parameter check before any store access.
    if variant_ids.is_empty() {
      return Err(AppError::Validation("no cart lines selected for checkout".to_string()));
    }
    let mut selected: Vec<Uuid> = Vec::with_capacity(variant_ids.len());
    for id in variant_ids {
      if !selected.contains(id) {
        selected.push(*id);
      }
    }

    self
      .store
      .address(address_id, user_id)
      .await?
      .ok_or(AppError::AddressNotFound(address_id))?;

    // The server cart is the authoritative source of quantities.
    let cart_snapshot = cart.cart().await?;
    let mut requested: Vec<(Uuid, u32)> = Vec::with_capacity(selected.len());
    for variant_id in &selected {
      let quantity = cart_snapshot
        .quantity_of(*variant_id)
        .ok_or_else(|| AppError::InvalidQuantity(format!("variant {} is not in the cart", variant_id)))?;
      requested.push((*variant_id, quantity));
    }

    let mut last_conflict = None;
    for attempt in 1..=self.id_allocation_limit {
      match self.commit_order(user_id, address_id, pay_method, &requested).await {
        Ok(header) => {
          info!(order_id = %header.order_id, total_amount_cents = header.total_amount_cents, "Order committed");
          // Best-effort cart cleanup, outside the atomic unit.
          if let Err(e) = cart.remove_lines(&selected).await {
            warn!(order_id = %header.order_id, error = %e, "Failed to clear checked-out cart lines");
          }
          return Ok(header);
        }
        Err(AppError::AllocationConflict(order_id)) => {
          // Clock collision with a previous order of the same user.
          // The whole unit was rolled back; retry with a fresh id.
          warn!(%order_id, attempt, "Order id collision, reallocating");
          last_conflict = Some(order_id);
        }
        Err(other) => return Err(other),
      }
    }
    Err(AppError::AllocationConflict(last_conflict.unwrap_or_default()))
  }

  /// One full attempt: provisional header, per-line CAS decrements,
  /// line persistence, totals, commit.
  async fn commit_order(
    &self,
    user_id: Uuid,
    address_id: Uuid,
    pay_method: PayMethod,
    requested: &[(Uuid, u32)],
  ) -> Result<OrderHeader> {
    let now = Utc::now();
    let mut header = OrderHeader {
      order_id: OrderHeader::allocate_id(user_id, now),
      user_id,
      address_id,
      total_count: 0,
      total_amount_cents: 0,
      shipping_cost_cents: self.shipping_cost_cents,
      pay_method,
      status: OrderStatus::AwaitingPayment,
      trade_id: None,
      created_at: now,
    };

    let mut tx = self.store.begin().await?;
    tx.insert_order(&header).await?;

    let mut total_count: i32 = 0;
    let mut goods_amount_cents: i64 = 0;

    for (variant_id, quantity) in requested {
      let (variant_id, quantity) = (*variant_id, *quantity);

      let mut decremented = false;
      for attempt in 1..=self.stock_retry_limit {
        let variant = tx.variant(variant_id).await?.ok_or(AppError::VariantNotFound(variant_id))?;

        if i64::from(quantity) > i64::from(variant.stock) {
          // Aborts the whole unit; the dropped transaction rolls back
          // the header and every earlier decrement.
          return Err(AppError::InsufficientStock {
            variant_id,
            requested: quantity,
            available: variant.stock,
          });
        }

        if tx.decrement_stock(variant_id, quantity, variant.stock).await? {
          tx.insert_order_line(&OrderLine {
            order_id: header.order_id.clone(),
            variant_id,
            quantity: quantity as i32,
            unit_price_cents: variant.price_cents,
            comment: None,
          })
          .await?;
          total_count += quantity as i32;
          goods_amount_cents += i64::from(quantity) * variant.price_cents;
          decremented = true;
          break;
        }
        warn!(%variant_id, attempt, "Optimistic stock decrement missed, re-reading");
      }

      if !decremented {
        return Err(AppError::CheckoutFailed(format!(
          "stock contention on variant {} after {} attempts",
          variant_id, self.stock_retry_limit
        )));
      }
    }

    header.total_count = total_count;
    header.total_amount_cents = goods_amount_cents + self.shipping_cost_cents;
    tx.finalize_order(&header.order_id, header.total_count, header.total_amount_cents)
      .await?;
    tx.commit().await?;
    Ok(header)
  }
}
