//! Postgres store. Schema lives in `schema.sql`.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Address, Category, GoodsBanner, OrderHeader, OrderLine, OrderStatus, ProductVariant, PromotionBanner};
use crate::storage::{CheckoutTx, StorefrontStore};

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

const VARIANT_COLUMNS: &str = "id, category_id, name, price_cents, stock, sales, created_at";
const ORDER_COLUMNS: &str =
  "order_id, user_id, address_id, total_count, total_amount_cents, shipping_cost_cents, pay_method, status, trade_id, created_at";

#[async_trait]
impl StorefrontStore for PgStore {
  async fn variant(&self, id: Uuid) -> Result<Option<ProductVariant>> {
    let variant = sqlx::query_as::<_, ProductVariant>(&format!(
      "SELECT {} FROM product_variants WHERE id = $1",
      VARIANT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(variant)
  }

  async fn variants_in_category(&self, category_id: Uuid) -> Result<Vec<ProductVariant>> {
    let variants = sqlx::query_as::<_, ProductVariant>(&format!(
      "SELECT {} FROM product_variants WHERE category_id = $1 ORDER BY created_at DESC",
      VARIANT_COLUMNS
    ))
    .bind(category_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(variants)
  }

  async fn categories(&self) -> Result<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
      .fetch_all(&self.pool)
      .await?;
    Ok(categories)
  }

  async fn goods_banners(&self) -> Result<Vec<GoodsBanner>> {
    let banners = sqlx::query_as::<_, GoodsBanner>(
      "SELECT id, variant_id, image_url, \"index\" FROM goods_banners ORDER BY \"index\"",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(banners)
  }

  async fn promotion_banners(&self) -> Result<Vec<PromotionBanner>> {
    let banners = sqlx::query_as::<_, PromotionBanner>(
      "SELECT id, name, url, image_url, \"index\" FROM promotion_banners ORDER BY \"index\"",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(banners)
  }

  async fn address(&self, id: Uuid, user_id: Uuid) -> Result<Option<Address>> {
    let address = sqlx::query_as::<_, Address>(
      "SELECT id, user_id, recipient, phone, detail, zip_code, created_at FROM addresses WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(address)
  }

  async fn latest_address(&self, user_id: Uuid) -> Result<Option<Address>> {
    let address = sqlx::query_as::<_, Address>(
      "SELECT id, user_id, recipient, phone, detail, zip_code, created_at FROM addresses \
       WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(address)
  }

  async fn create_address(&self, address: &Address) -> Result<()> {
    sqlx::query(
      "INSERT INTO addresses (id, user_id, recipient, phone, detail, zip_code, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(address.id)
    .bind(address.user_id)
    .bind(&address.recipient)
    .bind(&address.phone)
    .bind(&address.detail)
    .bind(&address.zip_code)
    .bind(address.created_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn order(&self, order_id: &str, user_id: Uuid) -> Result<Option<OrderHeader>> {
    let order = sqlx::query_as::<_, OrderHeader>(&format!(
      "SELECT {} FROM orders WHERE order_id = $1 AND user_id = $2",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(order)
  }

  async fn order_lines(&self, order_id: &str) -> Result<Vec<OrderLine>> {
    let lines = sqlx::query_as::<_, OrderLine>(
      "SELECT order_id, variant_id, quantity, unit_price_cents, comment FROM order_lines WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(lines)
  }

  async fn orders_for_user(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<OrderHeader>> {
    let orders = sqlx::query_as::<_, OrderHeader>(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&self.pool)
    .await?;
    Ok(orders)
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
    let result = sqlx::query(
      "UPDATE orders SET status = $1, trade_id = COALESCE($2, trade_id) WHERE order_id = $3 AND status = $4",
    )
    .bind(to)
    .bind(trade_id)
    .bind(order_id)
    .bind(from)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn set_line_comment(&self, order_id: &str, variant_id: Uuid, comment: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE order_lines SET comment = $1 WHERE order_id = $2 AND variant_id = $3")
      .bind(comment)
      .bind(order_id)
      .bind(variant_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn begin(&self) -> Result<Box<dyn CheckoutTx>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgCheckoutTx { tx }))
  }
}

struct PgCheckoutTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CheckoutTx for PgCheckoutTx {
  async fn variant(&mut self, id: Uuid) -> Result<Option<ProductVariant>> {
    let variant = sqlx::query_as::<_, ProductVariant>(&format!(
      "SELECT {} FROM product_variants WHERE id = $1",
      VARIANT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *self.tx)
    .await?;
    Ok(variant)
  }

  async fn insert_order(&mut self, header: &OrderHeader) -> Result<()> {
    let result = sqlx::query(&format!(
      "INSERT INTO orders ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
      ORDER_COLUMNS
    ))
    .bind(&header.order_id)
    .bind(header.user_id)
    .bind(header.address_id)
    .bind(header.total_count)
    .bind(header.total_amount_cents)
    .bind(header.shipping_cost_cents)
    .bind(header.pay_method)
    .bind(header.status)
    .bind(&header.trade_id)
    .bind(header.created_at)
    .execute(&mut *self.tx)
    .await;

    match result {
      Ok(_) => Ok(()),
      Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
        Err(AppError::AllocationConflict(header.order_id.clone()))
      }
      Err(other) => Err(other.into()),
    }
  }

  async fn decrement_stock(&mut self, variant_id: Uuid, quantity: u32, expected_stock: i32) -> Result<bool> {
    let quantity = quantity as i32;
    let result = sqlx::query(
      "UPDATE product_variants SET stock = stock - $1, sales = sales + $1 \
       WHERE id = $2 AND stock = $3 AND stock >= $1",
    )
    .bind(quantity)
    .bind(variant_id)
    .bind(expected_stock)
    .execute(&mut *self.tx)
    .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn insert_order_line(&mut self, line: &OrderLine) -> Result<()> {
    sqlx::query(
      "INSERT INTO order_lines (order_id, variant_id, quantity, unit_price_cents, comment) \
       VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&line.order_id)
    .bind(line.variant_id)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(&line.comment)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn finalize_order(&mut self, order_id: &str, total_count: i32, total_amount_cents: i64) -> Result<()> {
    sqlx::query("UPDATE orders SET total_count = $1, total_amount_cents = $2 WHERE order_id = $3")
      .bind(total_count)
      .bind(total_amount_cents)
      .bind(order_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    self.tx.commit().await?;
    Ok(())
  }
}
