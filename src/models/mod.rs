//! Data structures representing the storefront's durable entities.

pub mod address;
pub mod order;
pub mod order_line;
pub mod product;

pub use address::Address;
pub use order::{OrderHeader, OrderStatus, PayMethod};
pub use order_line::OrderLine;
pub use product::{Category, GoodsBanner, ProductVariant, PromotionBanner};
