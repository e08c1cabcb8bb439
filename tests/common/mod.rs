//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use chrono::Utc;
use uuid::Uuid;

use freshmart::models::{Address, OrderHeader, OrderLine, OrderStatus, PayMethod, ProductVariant};

pub fn variant(name: &str, price_cents: i64, stock: i32) -> ProductVariant {
  ProductVariant {
    id: Uuid::new_v4(),
    category_id: Uuid::new_v4(),
    name: name.to_string(),
    price_cents,
    stock,
    sales: 0,
    created_at: Utc::now(),
  }
}

pub fn address_for(user_id: Uuid) -> Address {
  Address {
    id: Uuid::new_v4(),
    user_id,
    recipient: "Pat Doe".to_string(),
    phone: "5551234".to_string(),
    detail: "1 Main St".to_string(),
    zip_code: "00100".to_string(),
    created_at: Utc::now(),
  }
}

pub fn order_awaiting(user_id: Uuid, address_id: Uuid, status: OrderStatus, pay_method: PayMethod) -> OrderHeader {
  OrderHeader {
    order_id: OrderHeader::allocate_id(user_id, Utc::now()),
    user_id,
    address_id,
    total_count: 2,
    total_amount_cents: 5000,
    shipping_cost_cents: 1000,
    pay_method,
    status,
    trade_id: None,
    created_at: Utc::now(),
  }
}

pub fn line(order_id: &str, variant_id: Uuid, quantity: i32, unit_price_cents: i64) -> OrderLine {
  OrderLine {
    order_id: order_id.to_string(),
    variant_id,
    quantity,
    unit_price_cents,
    comment: None,
  }
}
