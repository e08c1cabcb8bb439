//! Login-time reconciliation of the anonymous cookie cart into the
//! server cart, and the idempotence guard around it.

use uuid::Uuid;

use freshmart::cart::memory::MemoryCart;
use freshmart::cart::reconcile::{merge_on_login, MemoryMergeGuard};
use freshmart::cart::Cart;

#[tokio::test]
async fn merge_sums_shared_lines_and_keeps_the_rest() {
  let user_id = Uuid::new_v4();
  let shared = Uuid::new_v4();
  let cookie_only = Uuid::new_v4();

  let server = MemoryCart::new([(shared, 2)].into_iter().collect());
  let anonymous: Cart = [(shared, 3), (cookie_only, 1)].into_iter().collect();
  let guard = MemoryMergeGuard::default();

  let merged = merge_on_login(&server, &anonymous, user_id, "login-1", &guard)
    .await
    .unwrap();

  assert_eq!(merged.quantity_of(shared), Some(5));
  assert_eq!(merged.quantity_of(cookie_only), Some(1));
  assert_eq!(server.snapshot(), merged);
}

#[tokio::test]
async fn replayed_merge_token_does_not_double_count() {
  let user_id = Uuid::new_v4();
  let item = Uuid::new_v4();

  let server = MemoryCart::new([(item, 2)].into_iter().collect());
  let anonymous: Cart = [(item, 3)].into_iter().collect();
  let guard = MemoryMergeGuard::default();

  let first = merge_on_login(&server, &anonymous, user_id, "login-1", &guard)
    .await
    .unwrap();
  assert_eq!(first.quantity_of(item), Some(5));

  // Same cookie, same token, retried request: no second merge.
  let second = merge_on_login(&server, &anonymous, user_id, "login-1", &guard)
    .await
    .unwrap();
  assert_eq!(second.quantity_of(item), Some(5));
  assert_eq!(server.snapshot().quantity_of(item), Some(5));
}

#[tokio::test]
async fn a_fresh_token_merges_again() {
  let user_id = Uuid::new_v4();
  let item = Uuid::new_v4();

  let server = MemoryCart::new(Cart::new());
  let anonymous: Cart = [(item, 1)].into_iter().collect();
  let guard = MemoryMergeGuard::default();

  merge_on_login(&server, &anonymous, user_id, "login-1", &guard).await.unwrap();
  let merged = merge_on_login(&server, &anonymous, user_id, "login-2", &guard)
    .await
    .unwrap();

  // A genuinely new login with a leftover cookie merges once more.
  assert_eq!(merged.quantity_of(item), Some(2));
}

#[tokio::test]
async fn empty_cookie_cart_claims_no_token() {
  let user_id = Uuid::new_v4();
  let item = Uuid::new_v4();

  let server = MemoryCart::new([(item, 4)].into_iter().collect());
  let guard = MemoryMergeGuard::default();

  let merged = merge_on_login(&server, &Cart::new(), user_id, "login-1", &guard)
    .await
    .unwrap();
  assert_eq!(merged.quantity_of(item), Some(4));

  // The token stays claimable for a later non-empty merge.
  let anonymous: Cart = [(item, 1)].into_iter().collect();
  let merged = merge_on_login(&server, &anonymous, user_id, "login-1", &guard)
    .await
    .unwrap();
  assert_eq!(merged.quantity_of(item), Some(5));
}
