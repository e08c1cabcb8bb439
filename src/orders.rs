//! Order lifecycle: payment confirmation and review completion.
//!
//! An order is created in `AwaitingPayment` by the checkout engine and
//! walks the chain `AwaitingShipment -> AwaitingReceipt ->
//! AwaitingReview -> Completed`. The two transitions driven here are
//! payment confirmation (gateway poll) and the review close-out; the
//! shipment-side transitions belong to fulfillment and are only guarded
//! by the validity table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{OrderHeader, OrderStatus, PayMethod};
use crate::services::payment::{PaymentGateway, PaymentPoll};
use crate::storage::StorefrontStore;

pub struct OrderService {
  store: Arc<dyn StorefrontStore>,
  gateway: Arc<dyn PaymentGateway>,
  /// Maximum gateway polls per confirmation request.
  poll_limit: u32,
  poll_interval: Duration,
}

impl OrderService {
  pub fn new(
    store: Arc<dyn StorefrontStore>,
    gateway: Arc<dyn PaymentGateway>,
    poll_limit: u32,
    poll_interval: Duration,
  ) -> Self {
    Self {
      store,
      gateway,
      poll_limit: poll_limit.max(1),
      poll_interval,
    }
  }

  async fn unpaid_online_order(&self, user_id: Uuid, order_id: &str) -> Result<OrderHeader> {
    let order = self
      .store
      .order(order_id, user_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("order {}", order_id)))?;
    if order.status != OrderStatus::AwaitingPayment {
      return Err(AppError::Validation(format!(
        "order {} is not awaiting payment",
        order_id
      )));
    }
    if order.pay_method != PayMethod::Online {
      return Err(AppError::InvalidPayMethod(
        "order is not paid through the online gateway".to_string(),
      ));
    }
    Ok(order)
  }

  /// Register the order with the gateway and return the redirect URL.
  #[instrument(skip(self), fields(%user_id, order_id))]
  pub async fn start_payment(&self, user_id: Uuid, order_id: &str) -> Result<String> {
    let order = self.unpaid_online_order(user_id, order_id).await?;
    self
      .gateway
      .create_payment(order_id, order.total_amount_cents, "FreshMart order")
      .await
  }

  /// Poll the gateway for the payment result, bounded by `poll_limit`.
  ///
  /// `Pending` answers are re-polled after `poll_interval`; exhausting
  /// the budget surfaces as a payment failure while the order stays in
  /// `AwaitingPayment`, so the buyer can simply retry later.
  #[instrument(skip(self), fields(%user_id, order_id))]
  pub async fn confirm_payment(&self, user_id: Uuid, order_id: &str) -> Result<String> {
    self.unpaid_online_order(user_id, order_id).await?;

    for attempt in 1..=self.poll_limit {
      match self.gateway.query_payment(order_id).await? {
        PaymentPoll::Paid { trade_id } => {
          // Guarded by the current status, so a duplicate confirmation
          // request cannot re-apply the transition.
          let applied = self
            .store
            .transition_order(
              order_id,
              OrderStatus::AwaitingPayment,
              OrderStatus::AwaitingShipment,
              Some(&trade_id),
            )
            .await?;
          if !applied {
            warn!(order_id, "Payment already confirmed by a concurrent request");
          }
          info!(order_id, trade_id, "Payment confirmed");
          return Ok(trade_id);
        }
        PaymentPoll::Pending => {
          if attempt < self.poll_limit {
            tokio::time::sleep(self.poll_interval).await;
          }
        }
        PaymentPoll::Failed => {
          return Err(AppError::Payment(format!("payment for order {} failed", order_id)));
        }
      }
    }
    Err(AppError::Payment(format!(
      "payment for order {} still pending after {} polls",
      order_id, self.poll_limit
    )))
  }

  /// Apply review comments to an order's lines and close the order out
  /// when every line carries one.
  ///
  /// The transition is all-or-nothing per order: it happens only once
  /// ALL lines have a non-empty comment, verified against the stored
  /// lines rather than any client-supplied count. Returns whether the
  /// order reached `Completed`.
  #[instrument(skip(self, comments), fields(%user_id, order_id, submitted = comments.len()))]
  pub async fn submit_comments(&self, user_id: Uuid, order_id: &str, comments: &HashMap<Uuid, String>) -> Result<bool> {
    let order = self
      .store
      .order(order_id, user_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("order {}", order_id)))?;
    if order.status != OrderStatus::AwaitingReview {
      return Err(AppError::Validation(format!("order {} is not awaiting review", order_id)));
    }

    for (variant_id, text) in comments {
      let text = text.trim();
      if text.is_empty() {
        continue;
      }
      // A comment for a line that is not part of the order is skipped,
      // not an error.
      if !self.store.set_line_comment(order_id, *variant_id, text).await? {
        warn!(order_id, %variant_id, "Ignoring comment for unknown order line");
      }
    }

    let lines = self.store.order_lines(order_id).await?;
    let fully_reviewed = !lines.is_empty()
      && lines
        .iter()
        .all(|line| line.comment.as_deref().map(str::trim).is_some_and(|c| !c.is_empty()));

    if !fully_reviewed {
      return Ok(false);
    }
    let completed = self
      .store
      .transition_order(order_id, OrderStatus::AwaitingReview, OrderStatus::Completed, None)
      .await?;
    if completed {
      info!(order_id, "Order completed, all lines reviewed");
    }
    Ok(completed)
  }
}
