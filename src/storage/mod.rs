//! Durable store seam.
//!
//! Everything the storefront persists outside Redis goes through
//! [`StorefrontStore`]. Checkout's all-or-nothing unit of work is a
//! [`CheckoutTx`]: every write staged inside one is either committed as
//! a whole or discarded when the transaction drops.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Address, Category, GoodsBanner, OrderHeader, OrderLine, OrderStatus, ProductVariant, PromotionBanner};

#[async_trait]
pub trait StorefrontStore: Send + Sync {
  // --- Catalog reads ---
  async fn variant(&self, id: Uuid) -> Result<Option<ProductVariant>>;
  async fn variants_in_category(&self, category_id: Uuid) -> Result<Vec<ProductVariant>>;
  async fn categories(&self) -> Result<Vec<Category>>;
  async fn goods_banners(&self) -> Result<Vec<GoodsBanner>>;
  async fn promotion_banners(&self) -> Result<Vec<PromotionBanner>>;

  // --- Addresses ---
  async fn address(&self, id: Uuid, user_id: Uuid) -> Result<Option<Address>>;
  async fn latest_address(&self, user_id: Uuid) -> Result<Option<Address>>;
  async fn create_address(&self, address: &Address) -> Result<()>;

  // --- Order reads ---
  async fn order(&self, order_id: &str, user_id: Uuid) -> Result<Option<OrderHeader>>;
  async fn order_lines(&self, order_id: &str) -> Result<Vec<OrderLine>>;
  async fn orders_for_user(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<OrderHeader>>;

  // --- Order lifecycle writes ---

  /// Move an order from `from` to `to`, optionally recording the
  /// gateway trade id. Returns false when the order was not in `from`,
  /// which keeps duplicate confirmations from double-applying. A pair
  /// the transition table rejects is an error, not a miss.
  async fn transition_order(
    &self,
    order_id: &str,
    from: OrderStatus,
    to: OrderStatus,
    trade_id: Option<&str>,
  ) -> Result<bool>;

  /// Attach review text to one order line. Returns false when no such
  /// line exists.
  async fn set_line_comment(&self, order_id: &str, variant_id: Uuid, comment: &str) -> Result<bool>;

  // --- Checkout unit of work ---
  async fn begin(&self) -> Result<Box<dyn CheckoutTx>>;
}

/// The checkout transaction. Dropping one without calling
/// [`CheckoutTx::commit`] rolls every staged write back.
#[async_trait]
pub trait CheckoutTx: Send {
  /// Current variant row as seen inside the transaction.
  async fn variant(&mut self, id: Uuid) -> Result<Option<ProductVariant>>;

  /// Insert the provisional order header. Fails with
  /// `AllocationConflict` when the order id is already taken.
  async fn insert_order(&mut self, header: &OrderHeader) -> Result<()>;

  /// Compare-and-set stock decrement: `stock -= quantity, sales +=
  /// quantity`, guarded by the previously read stock value. Returns
  /// false when the guard missed (concurrent modification).
  async fn decrement_stock(&mut self, variant_id: Uuid, quantity: u32, expected_stock: i32) -> Result<bool>;

  async fn insert_order_line(&mut self, line: &OrderLine) -> Result<()>;

  /// Write the accumulated totals onto the provisional header.
  async fn finalize_order(&mut self, order_id: &str, total_count: i32, total_amount_cents: i64) -> Result<()>;

  async fn commit(self: Box<Self>) -> Result<()>;
}
