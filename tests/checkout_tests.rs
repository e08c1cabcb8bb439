//! Checkout engine behavior over the in-memory store: totals, stock
//! movement, atomic abort, and the concurrent-buyers race.

mod common;

use std::sync::Arc;

use uuid::Uuid;

use freshmart::cart::{Cart, MemoryCart};
use freshmart::checkout::CheckoutEngine;
use freshmart::errors::AppError;
use freshmart::models::PayMethod;
use freshmart::storage::{MemoryStore, StorefrontStore};

use common::{address_for, variant};

const SHIPPING: i64 = 1000;

async fn engine_with_store() -> (CheckoutEngine, Arc<MemoryStore>) {
  let store = Arc::new(MemoryStore::new());
  let engine = CheckoutEngine::new(store.clone(), 3);
  (engine, store)
}

#[tokio::test]
async fn checkout_captures_prices_and_decrements_stock() {
  let (engine, store) = engine_with_store().await;
  let user_id = Uuid::new_v4();
  let address = address_for(user_id);
  let apples = variant("apples 1kg", 350, 10);
  let milk = variant("milk 1l", 120, 8);
  store.insert_address(address.clone()).await;
  store.insert_variant(apples.clone()).await;
  store.insert_variant(milk.clone()).await;

  let cart = MemoryCart::new([(apples.id, 2), (milk.id, 3)].into_iter().collect());

  let header = engine
    .checkout(user_id, address.id, PayMethod::Online, &[apples.id, milk.id], &cart)
    .await
    .expect("checkout should succeed");

  assert_eq!(header.total_count, 5);
  assert_eq!(header.total_amount_cents, 2 * 350 + 3 * 120 + SHIPPING);
  assert_eq!(header.shipping_cost_cents, SHIPPING);

  let stored = store
    .order(&header.order_id, user_id)
    .await
    .unwrap()
    .expect("order persisted");
  assert_eq!(stored.total_amount_cents, header.total_amount_cents);

  let lines = store.order_lines(&header.order_id).await.unwrap();
  assert_eq!(lines.len(), 2);
  let apple_line = lines.iter().find(|l| l.variant_id == apples.id).unwrap();
  assert_eq!(apple_line.quantity, 2);
  assert_eq!(apple_line.unit_price_cents, 350);

  let apples_after = store.variant(apples.id).await.unwrap().unwrap();
  assert_eq!(apples_after.stock, 8);
  assert_eq!(apples_after.sales, 2);
  let milk_after = store.variant(milk.id).await.unwrap().unwrap();
  assert_eq!(milk_after.stock, 5);
  assert_eq!(milk_after.sales, 3);

  // Checked-out lines are cleared from the cart.
  assert!(cart.snapshot().is_empty());
}

#[tokio::test]
async fn checkout_rejects_empty_selection_before_touching_the_store() {
  let (engine, _store) = engine_with_store().await;
  let cart = MemoryCart::new(Cart::new());

  let err = engine
    .checkout(Uuid::new_v4(), Uuid::new_v4(), PayMethod::Online, &[], &cart)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn checkout_requires_an_address_owned_by_the_buyer() {
  let (engine, store) = engine_with_store().await;
  let user_id = Uuid::new_v4();
  let someone_else = address_for(Uuid::new_v4());
  store.insert_address(someone_else.clone()).await;

  let item = variant("eggs", 200, 5);
  store.insert_variant(item.clone()).await;
  let cart = MemoryCart::new([(item.id, 1)].into_iter().collect());

  let err = engine
    .checkout(user_id, someone_else.id, PayMethod::Online, &[item.id], &cart)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::AddressNotFound(_)));
}

#[tokio::test]
async fn checkout_rejects_selection_not_present_in_the_cart() {
  let (engine, store) = engine_with_store().await;
  let user_id = Uuid::new_v4();
  let address = address_for(user_id);
  store.insert_address(address.clone()).await;
  let item = variant("eggs", 200, 5);
  store.insert_variant(item.clone()).await;

  let cart = MemoryCart::new(Cart::new());

  let err = engine
    .checkout(user_id, address.id, PayMethod::Online, &[item.id], &cart)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::InvalidQuantity(_)));
}

#[tokio::test]
async fn duplicate_selection_entries_count_once() {
  let (engine, store) = engine_with_store().await;
  let user_id = Uuid::new_v4();
  let address = address_for(user_id);
  store.insert_address(address.clone()).await;
  let item = variant("eggs", 200, 5);
  store.insert_variant(item.clone()).await;

  let cart = MemoryCart::new([(item.id, 2)].into_iter().collect());

  let header = engine
    .checkout(user_id, address.id, PayMethod::Online, &[item.id, item.id], &cart)
    .await
    .unwrap();
  assert_eq!(header.total_count, 2);
  assert_eq!(store.variant(item.id).await.unwrap().unwrap().stock, 3);
}

#[tokio::test]
async fn back_to_back_checkouts_by_one_user_both_commit() {
  let (engine, store) = engine_with_store().await;
  let user_id = Uuid::new_v4();
  let address = address_for(user_id);
  store.insert_address(address.clone()).await;
  let item = variant("eggs", 200, 10);
  store.insert_variant(item.clone()).await;

  // Two commits inside the same wall-clock second must get distinct
  // order ids rather than burning the allocation retries.
  let cart = MemoryCart::new([(item.id, 1)].into_iter().collect());
  let first = engine
    .checkout(user_id, address.id, PayMethod::Online, &[item.id], &cart)
    .await
    .unwrap();

  let cart = MemoryCart::new([(item.id, 2)].into_iter().collect());
  let second = engine
    .checkout(user_id, address.id, PayMethod::Online, &[item.id], &cart)
    .await
    .unwrap();

  assert_ne!(first.order_id, second.order_id);
  assert_eq!(store.orders_for_user(user_id, 10, 0).await.unwrap().len(), 2);
  assert_eq!(store.variant(item.id).await.unwrap().unwrap().stock, 7);
}

#[tokio::test]
async fn insufficient_stock_aborts_the_whole_order() {
  let (engine, store) = engine_with_store().await;
  let user_id = Uuid::new_v4();
  let address = address_for(user_id);
  store.insert_address(address.clone()).await;
  let plenty = variant("rice 5kg", 900, 20);
  let scarce = variant("truffles", 4500, 1);
  store.insert_variant(plenty.clone()).await;
  store.insert_variant(scarce.clone()).await;

  let cart = MemoryCart::new([(plenty.id, 2), (scarce.id, 3)].into_iter().collect());

  let err = engine
    .checkout(user_id, address.id, PayMethod::Online, &[plenty.id, scarce.id], &cart)
    .await
    .unwrap_err();
  match err {
    AppError::InsufficientStock {
      variant_id,
      requested,
      available,
    } => {
      assert_eq!(variant_id, scarce.id);
      assert_eq!(requested, 3);
      assert_eq!(available, 1);
    }
    other => panic!("expected InsufficientStock, got {:?}", other),
  }

  // Nothing leaked: no order, no stock movement on the line that had
  // already been decremented inside the aborted unit.
  assert!(store.orders_for_user(user_id, 10, 0).await.unwrap().is_empty());
  assert_eq!(store.variant(plenty.id).await.unwrap().unwrap().stock, 20);
  assert_eq!(store.variant(scarce.id).await.unwrap().unwrap().stock, 1);

  // The cart is untouched on failure.
  assert_eq!(cart.snapshot().total_quantity(), 5);
}

#[tokio::test]
async fn concurrent_buyers_cannot_oversell() {
  let (engine, store) = engine_with_store().await;
  let engine = Arc::new(engine);
  let item = variant("last crate of mangoes", 600, 5);
  store.insert_variant(item.clone()).await;

  let buyer_a = Uuid::new_v4();
  let buyer_b = Uuid::new_v4();
  let address_a = address_for(buyer_a);
  let address_b = address_for(buyer_b);
  store.insert_address(address_a.clone()).await;
  store.insert_address(address_b.clone()).await;

  let run = |user_id: Uuid, address_id: Uuid| {
    let engine = engine.clone();
    let variant_id = item.id;
    tokio::spawn(async move {
      let cart = MemoryCart::new([(variant_id, 3)].into_iter().collect());
      engine
        .checkout(user_id, address_id, PayMethod::Online, &[variant_id], &cart)
        .await
    })
  };

  let a = run(buyer_a, address_a.id);
  let b = run(buyer_b, address_b.id);
  let results = [a.await.unwrap(), b.await.unwrap()];

  let committed = results.iter().filter(|r| r.is_ok()).count();
  assert_eq!(committed, 1, "exactly one of two competing checkouts must win");
  let loser = results.iter().find(|r| r.is_err()).unwrap();
  assert!(matches!(
    loser,
    Err(AppError::InsufficientStock { .. }) | Err(AppError::CheckoutFailed(_))
  ));

  let after = store.variant(item.id).await.unwrap().unwrap();
  assert_eq!(after.stock, 2);
  assert_eq!(after.sales, 3);
}
