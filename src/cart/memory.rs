use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::cart::{Cart, CartStore};
use crate::errors::Result;

/// Cart held entirely in process memory. Backs the anonymous
/// cookie-decoded cart for the duration of a request, and stands in for
/// the Redis store in tests.
#[derive(Debug, Default)]
pub struct MemoryCart {
  cart: Mutex<Cart>,
}

impl MemoryCart {
  pub fn new(cart: Cart) -> Self {
    Self { cart: Mutex::new(cart) }
  }

  /// Current contents, for cookie re-serialization after mutation.
  pub fn snapshot(&self) -> Cart {
    self.cart.lock().clone()
  }
}

#[async_trait]
impl CartStore for MemoryCart {
  async fn cart(&self) -> Result<Cart> {
    Ok(self.cart.lock().clone())
  }

  async fn set_line(&self, variant_id: Uuid, quantity: u32) -> Result<()> {
    self.cart.lock().set(variant_id, quantity)
  }

  async fn remove_line(&self, variant_id: Uuid) -> Result<()> {
    self.cart.lock().remove(variant_id);
    Ok(())
  }

  async fn remove_lines(&self, variant_ids: &[Uuid]) -> Result<()> {
    let mut guard = self.cart.lock();
    for variant_id in variant_ids {
      guard.remove(*variant_id);
    }
    Ok(())
  }

  async fn replace(&self, cart: &Cart) -> Result<()> {
    *self.cart.lock() = cart.clone();
    Ok(())
  }
}
