//! In-memory store for tests and single-process development.
//!
//! The checkout transaction takes the whole-store lock for its
//! lifetime and works on a staged clone; commit swaps the staged state
//! in, rollback is simply dropping it. Concurrent checkouts therefore
//! serialize on the lock, which preserves exactly the visibility the
//! Postgres implementation provides.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Address, Category, GoodsBanner, OrderHeader, OrderLine, OrderStatus, ProductVariant, PromotionBanner};
use crate::storage::{CheckoutTx, StorefrontStore};

#[derive(Debug, Default, Clone)]
struct Inner {
  variants: HashMap<Uuid, ProductVariant>,
  categories: Vec<Category>,
  goods_banners: Vec<GoodsBanner>,
  promotion_banners: Vec<PromotionBanner>,
  addresses: HashMap<Uuid, Address>,
  orders: HashMap<String, OrderHeader>,
  order_lines: Vec<OrderLine>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
  inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  // Seeding helpers.

  pub async fn insert_variant(&self, variant: ProductVariant) {
    self.inner.lock().await.variants.insert(variant.id, variant);
  }

  pub async fn insert_category(&self, category: Category) {
    self.inner.lock().await.categories.push(category);
  }

  pub async fn insert_goods_banner(&self, banner: GoodsBanner) {
    self.inner.lock().await.goods_banners.push(banner);
  }

  pub async fn insert_promotion_banner(&self, banner: PromotionBanner) {
    self.inner.lock().await.promotion_banners.push(banner);
  }

  pub async fn insert_address(&self, address: Address) {
    self.inner.lock().await.addresses.insert(address.id, address);
  }

  /// Drop an order directly into the store, for exercising lifecycle
  /// stages that checkout alone cannot reach.
  pub async fn insert_order_with_lines(&self, header: OrderHeader, lines: Vec<OrderLine>) {
    let mut inner = self.inner.lock().await;
    inner.orders.insert(header.order_id.clone(), header);
    inner.order_lines.extend(lines);
  }
}

#[async_trait]
impl StorefrontStore for MemoryStore {
  async fn variant(&self, id: Uuid) -> Result<Option<ProductVariant>> {
    Ok(self.inner.lock().await.variants.get(&id).cloned())
  }

  async fn variants_in_category(&self, category_id: Uuid) -> Result<Vec<ProductVariant>> {
    let inner = self.inner.lock().await;
    let mut variants: Vec<ProductVariant> = inner
      .variants
      .values()
      .filter(|v| v.category_id == category_id)
      .cloned()
      .collect();
    variants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(variants)
  }

  async fn categories(&self) -> Result<Vec<Category>> {
    Ok(self.inner.lock().await.categories.clone())
  }

  async fn goods_banners(&self) -> Result<Vec<GoodsBanner>> {
    let mut banners = self.inner.lock().await.goods_banners.clone();
    banners.sort_by_key(|b| b.index);
    Ok(banners)
  }

  async fn promotion_banners(&self) -> Result<Vec<PromotionBanner>> {
    let mut banners = self.inner.lock().await.promotion_banners.clone();
    banners.sort_by_key(|b| b.index);
    Ok(banners)
  }

  async fn address(&self, id: Uuid, user_id: Uuid) -> Result<Option<Address>> {
    Ok(
      self
        .inner
        .lock()
        .await
        .addresses
        .get(&id)
        .filter(|a| a.user_id == user_id)
        .cloned(),
    )
  }

  async fn latest_address(&self, user_id: Uuid) -> Result<Option<Address>> {
    Ok(
      self
        .inner
        .lock()
        .await
        .addresses
        .values()
        .filter(|a| a.user_id == user_id)
        .max_by_key(|a| a.created_at)
        .cloned(),
    )
  }

  async fn create_address(&self, address: &Address) -> Result<()> {
    self.inner.lock().await.addresses.insert(address.id, address.clone());
    Ok(())
  }

  async fn order(&self, order_id: &str, user_id: Uuid) -> Result<Option<OrderHeader>> {
    Ok(
      self
        .inner
        .lock()
        .await
        .orders
        .get(order_id)
        .filter(|o| o.user_id == user_id)
        .cloned(),
    )
  }

  async fn order_lines(&self, order_id: &str) -> Result<Vec<OrderLine>> {
    Ok(
      self
        .inner
        .lock()
        .await
        .order_lines
        .iter()
        .filter(|l| l.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn orders_for_user(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<OrderHeader>> {
    let inner = self.inner.lock().await;
    let mut orders: Vec<OrderHeader> = inner.orders.values().filter(|o| o.user_id == user_id).cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(
      orders
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect(),
    )
  }

  async fn transition_order(
    &self,
    order_id: &str,
    from: OrderStatus,
    to: OrderStatus,
    trade_id: Option<&str>,
  ) -> Result<bool> {
    if !from.can_transition_to(to) {
      return Err(AppError::Validation(format!(
        "illegal order status transition {:?} -> {:?}",
        from, to
      )));
    }
    let mut inner = self.inner.lock().await;
    match inner.orders.get_mut(order_id) {
      Some(order) if order.status == from => {
        order.status = to;
        if let Some(trade_id) = trade_id {
          order.trade_id = Some(trade_id.to_string());
        }
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn set_line_comment(&self, order_id: &str, variant_id: Uuid, comment: &str) -> Result<bool> {
    let mut inner = self.inner.lock().await;
    match inner
      .order_lines
      .iter_mut()
      .find(|l| l.order_id == order_id && l.variant_id == variant_id)
    {
      Some(line) => {
        line.comment = Some(comment.to_string());
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn begin(&self) -> Result<Box<dyn CheckoutTx>> {
    let guard = self.inner.clone().lock_owned().await;
    let staged = guard.clone();
    Ok(Box::new(MemoryTx { guard, staged }))
  }
}

struct MemoryTx {
  guard: OwnedMutexGuard<Inner>,
  staged: Inner,
}

#[async_trait]
impl CheckoutTx for MemoryTx {
  async fn variant(&mut self, id: Uuid) -> Result<Option<ProductVariant>> {
    Ok(self.staged.variants.get(&id).cloned())
  }

  async fn insert_order(&mut self, header: &OrderHeader) -> Result<()> {
    if self.staged.orders.contains_key(&header.order_id) {
      return Err(AppError::AllocationConflict(header.order_id.clone()));
    }
    self.staged.orders.insert(header.order_id.clone(), header.clone());
    Ok(())
  }

  async fn decrement_stock(&mut self, variant_id: Uuid, quantity: u32, expected_stock: i32) -> Result<bool> {
    let variant = match self.staged.variants.get_mut(&variant_id) {
      Some(v) => v,
      None => return Ok(false),
    };
    let quantity = quantity as i32;
    if variant.stock != expected_stock || variant.stock < quantity {
      return Ok(false);
    }
    variant.stock -= quantity;
    variant.sales += quantity;
    Ok(true)
  }

  async fn insert_order_line(&mut self, line: &OrderLine) -> Result<()> {
    self.staged.order_lines.push(line.clone());
    Ok(())
  }

  async fn finalize_order(&mut self, order_id: &str, total_count: i32, total_amount_cents: i64) -> Result<()> {
    let order = self
      .staged
      .orders
      .get_mut(order_id)
      .ok_or_else(|| AppError::Internal(format!("finalize_order: unknown order {}", order_id)))?;
    order.total_count = total_count;
    order.total_amount_cents = total_amount_cents;
    Ok(())
  }

  async fn commit(mut self: Box<Self>) -> Result<()> {
    *self.guard = self.staged;
    Ok(())
  }
}
