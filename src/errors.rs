use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Application error type. The checkout/cart error kinds are part of the
/// storefront contract; the remaining variants wrap infrastructure and
/// request-level failures.
#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Invalid quantity: {0}")]
  InvalidQuantity(String),

  #[error("Product variant not found: {0}")]
  VariantNotFound(uuid::Uuid),

  #[error("Insufficient stock for variant {variant_id}: requested {requested}, available {available}")]
  InsufficientStock {
    variant_id: uuid::Uuid,
    requested: u32,
    available: i32,
  },

  #[error("Checkout failed: {0}")]
  CheckoutFailed(String),

  #[error("Address not found: {0}")]
  AddressNotFound(uuid::Uuid),

  #[error("Invalid pay method: {0}")]
  InvalidPayMethod(String),

  #[error("Order id allocation conflict for order {0}")]
  AllocationConflict(String),

  #[error("Payment Processing Error: {0}")]
  Payment(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Redis Error: {0}")]
  Redis(#[from] redis::RedisError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in handlers that use `?` on functions returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    if err.is::<sqlx::Error>() {
      return AppError::Sqlx(err.downcast::<sqlx::Error>().unwrap());
    }
    AppError::Internal(err.to_string())
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response.
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({"error": m})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::InvalidQuantity(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::VariantNotFound(id) => {
        HttpResponse::NotFound().json(json!({"error": "Product variant not found", "variantId": id}))
      }
      AppError::InsufficientStock { variant_id, .. } => {
        HttpResponse::Conflict().json(json!({"error": "Insufficient stock", "variantId": variant_id}))
      }
      AppError::CheckoutFailed(m) => HttpResponse::Conflict().json(json!({"error": m})),
      AppError::AddressNotFound(id) => {
        HttpResponse::BadRequest().json(json!({"error": "Address not found", "addressId": id}))
      }
      AppError::InvalidPayMethod(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::AllocationConflict(_) => {
        HttpResponse::Conflict().json(json!({"error": "Order could not be allocated, please retry"}))
      }
      AppError::Payment(m) => HttpResponse::PaymentRequired().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Sqlx(_) => HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"})),
      AppError::Redis(_) => HttpResponse::InternalServerError().json(json!({"error": "Cache operation failed"})),
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

// Define a Result type alias for the application.
pub type Result<T, E = AppError> = std::result::Result<T, E>;
