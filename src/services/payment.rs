//! Payment gateway seam.
//!
//! The core only ever needs two operations: create a payment and ask
//! what happened to it. Everything else about the provider's protocol
//! stays behind this trait.

use std::collections::HashMap;
use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};

/// One answer from the gateway's query endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPoll {
  /// Definitive success; `trade_id` is the gateway-side transaction id.
  Paid { trade_id: String },
  /// The buyer has not finished paying yet; poll again.
  Pending,
  /// Definitive failure.
  Failed,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Register a payment and return the URL the buyer is redirected to.
  async fn create_payment(&self, order_id: &str, amount_cents: i64, subject: &str) -> Result<String>;

  /// Query the current state of a previously created payment.
  async fn query_payment(&self, order_id: &str) -> Result<PaymentPoll>;
}

/// In-process gateway used in development and tests. Payments succeed
/// by default; per-order responses can be scripted to exercise the
/// pending/failure paths.
#[derive(Debug, Default)]
pub struct MockPaymentGateway {
  base_url: String,
  scripted: Mutex<HashMap<String, VecDeque<PaymentPoll>>>,
}

impl MockPaymentGateway {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      scripted: Mutex::new(HashMap::new()),
    }
  }

  /// Queue the answers `query_payment` will hand out for `order_id`,
  /// in order. Once drained, the gateway reports success.
  pub fn script_responses(&self, order_id: &str, responses: impl IntoIterator<Item = PaymentPoll>) {
    self
      .scripted
      .lock()
      .insert(order_id.to_string(), responses.into_iter().collect());
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(skip(self))]
  async fn create_payment(&self, order_id: &str, amount_cents: i64, subject: &str) -> Result<String> {
    if amount_cents <= 0 {
      return Err(AppError::Payment("Amount must be greater than zero".to_string()));
    }
    let url = format!("{}/mock-pay?out_trade_no={}&subject={}", self.base_url, order_id, subject);
    info!(%order_id, amount_cents, "Mock payment created");
    Ok(url)
  }

  async fn query_payment(&self, order_id: &str) -> Result<PaymentPoll> {
    if let Some(queue) = self.scripted.lock().get_mut(order_id) {
      if let Some(next) = queue.pop_front() {
        return Ok(next);
      }
    }
    Ok(PaymentPoll::Paid {
      trade_id: format!("mock_trade_{}", Uuid::new_v4().simple()),
    })
  }
}
