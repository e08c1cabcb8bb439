//! Order lifecycle over the in-memory store: payment start/confirm with
//! a scripted gateway, and the review-to-completed close-out.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use freshmart::errors::AppError;
use freshmart::models::{OrderStatus, PayMethod};
use freshmart::orders::OrderService;
use freshmart::services::payment::{MockPaymentGateway, PaymentPoll};
use freshmart::storage::{MemoryStore, StorefrontStore};

use common::{address_for, line, order_awaiting, variant};

const POLL_LIMIT: u32 = 3;

fn service(store: Arc<MemoryStore>, gateway: Arc<MockPaymentGateway>) -> OrderService {
  OrderService::new(store, gateway, POLL_LIMIT, Duration::from_millis(1))
}

async fn seeded_order(store: &MemoryStore, status: OrderStatus, pay_method: PayMethod) -> (Uuid, String, Uuid) {
  let user_id = Uuid::new_v4();
  let address = address_for(user_id);
  store.insert_address(address.clone()).await;
  let item = variant("oranges 2kg", 500, 10);
  store.insert_variant(item.clone()).await;

  let header = order_awaiting(user_id, address.id, status, pay_method);
  let order_id = header.order_id.clone();
  let lines = vec![line(&order_id, item.id, 2, 500)];
  store.insert_order_with_lines(header, lines).await;
  (user_id, order_id, item.id)
}

#[tokio::test]
async fn start_payment_returns_gateway_redirect() {
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(MockPaymentGateway::new("http://localhost:8080"));
  let orders = service(store.clone(), gateway.clone());
  let (user_id, order_id, _) = seeded_order(&store, OrderStatus::AwaitingPayment, PayMethod::Online).await;

  let url = orders.start_payment(user_id, &order_id).await.unwrap();
  assert!(url.contains(&order_id));
}

#[tokio::test]
async fn start_payment_rejects_cash_on_delivery_orders() {
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(MockPaymentGateway::new("http://localhost:8080"));
  let orders = service(store.clone(), gateway.clone());
  let (user_id, order_id, _) = seeded_order(&store, OrderStatus::AwaitingPayment, PayMethod::CashOnDelivery).await;

  let err = orders.start_payment(user_id, &order_id).await.unwrap_err();
  assert!(matches!(err, AppError::InvalidPayMethod(_)));
}

#[tokio::test]
async fn start_payment_rejects_orders_past_payment() {
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(MockPaymentGateway::new("http://localhost:8080"));
  let orders = service(store.clone(), gateway.clone());
  let (user_id, order_id, _) = seeded_order(&store, OrderStatus::AwaitingShipment, PayMethod::Online).await;

  let err = orders.start_payment(user_id, &order_id).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn confirm_payment_advances_after_pending_polls() {
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(MockPaymentGateway::new("http://localhost:8080"));
  let orders = service(store.clone(), gateway.clone());
  let (user_id, order_id, _) = seeded_order(&store, OrderStatus::AwaitingPayment, PayMethod::Online).await;

  gateway.script_responses(
    &order_id,
    [
      PaymentPoll::Pending,
      PaymentPoll::Paid {
        trade_id: "trade-42".to_string(),
      },
    ],
  );

  let trade_id = orders.confirm_payment(user_id, &order_id).await.unwrap();
  assert_eq!(trade_id, "trade-42");

  let after = store.order(&order_id, user_id).await.unwrap().unwrap();
  assert_eq!(after.status, OrderStatus::AwaitingShipment);
  assert_eq!(after.trade_id.as_deref(), Some("trade-42"));
}

#[tokio::test]
async fn confirm_payment_gives_up_after_the_poll_budget() {
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(MockPaymentGateway::new("http://localhost:8080"));
  let orders = service(store.clone(), gateway.clone());
  let (user_id, order_id, _) = seeded_order(&store, OrderStatus::AwaitingPayment, PayMethod::Online).await;

  gateway.script_responses(&order_id, std::iter::repeat(PaymentPoll::Pending).take(POLL_LIMIT as usize + 2));

  let err = orders.confirm_payment(user_id, &order_id).await.unwrap_err();
  assert!(matches!(err, AppError::Payment(_)));

  // Giving up leaves the order payable; the buyer can retry later.
  let after = store.order(&order_id, user_id).await.unwrap().unwrap();
  assert_eq!(after.status, OrderStatus::AwaitingPayment);
  assert!(after.trade_id.is_none());
}

#[tokio::test]
async fn confirm_payment_surfaces_gateway_failure() {
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(MockPaymentGateway::new("http://localhost:8080"));
  let orders = service(store.clone(), gateway.clone());
  let (user_id, order_id, _) = seeded_order(&store, OrderStatus::AwaitingPayment, PayMethod::Online).await;

  gateway.script_responses(&order_id, [PaymentPoll::Failed]);

  let err = orders.confirm_payment(user_id, &order_id).await.unwrap_err();
  assert!(matches!(err, AppError::Payment(_)));
  let after = store.order(&order_id, user_id).await.unwrap().unwrap();
  assert_eq!(after.status, OrderStatus::AwaitingPayment);
}

#[tokio::test]
async fn partial_reviews_leave_the_order_open() {
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(MockPaymentGateway::new("http://localhost:8080"));
  let orders = service(store.clone(), gateway.clone());

  let user_id = Uuid::new_v4();
  let address = address_for(user_id);
  store.insert_address(address.clone()).await;
  let first = variant("bread", 150, 10);
  let second = variant("butter", 300, 10);
  store.insert_variant(first.clone()).await;
  store.insert_variant(second.clone()).await;

  let header = order_awaiting(user_id, address.id, OrderStatus::AwaitingReview, PayMethod::Online);
  let order_id = header.order_id.clone();
  store
    .insert_order_with_lines(
      header,
      vec![line(&order_id, first.id, 1, 150), line(&order_id, second.id, 1, 300)],
    )
    .await;

  // Only one of two lines reviewed; a blank comment does not count.
  let mut comments = HashMap::new();
  comments.insert(first.id, "crusty and fresh".to_string());
  comments.insert(second.id, "   ".to_string());

  let completed = orders.submit_comments(user_id, &order_id, &comments).await.unwrap();
  assert!(!completed);
  let after = store.order(&order_id, user_id).await.unwrap().unwrap();
  assert_eq!(after.status, OrderStatus::AwaitingReview);

  // The remaining line closes the order out.
  let mut rest = HashMap::new();
  rest.insert(second.id, "melts nicely".to_string());
  let completed = orders.submit_comments(user_id, &order_id, &rest).await.unwrap();
  assert!(completed);
  let after = store.order(&order_id, user_id).await.unwrap().unwrap();
  assert_eq!(after.status, OrderStatus::Completed);

  let lines = store.order_lines(&order_id).await.unwrap();
  assert!(lines.iter().all(|l| l.comment.is_some()));
}

#[tokio::test]
async fn comments_for_unknown_lines_are_ignored() {
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(MockPaymentGateway::new("http://localhost:8080"));
  let orders = service(store.clone(), gateway.clone());
  let (user_id, order_id, variant_id) = seeded_order(&store, OrderStatus::AwaitingReview, PayMethod::Online).await;

  let mut comments = HashMap::new();
  comments.insert(variant_id, "good".to_string());
  comments.insert(Uuid::new_v4(), "not part of this order".to_string());

  let completed = orders.submit_comments(user_id, &order_id, &comments).await.unwrap();
  assert!(completed);
  assert_eq!(store.order_lines(&order_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn comments_require_awaiting_review() {
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(MockPaymentGateway::new("http://localhost:8080"));
  let orders = service(store.clone(), gateway.clone());
  let (user_id, order_id, variant_id) = seeded_order(&store, OrderStatus::AwaitingPayment, PayMethod::Online).await;

  let mut comments = HashMap::new();
  comments.insert(variant_id, "too early".to_string());

  let err = orders.submit_comments(user_id, &order_id, &comments).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
}
