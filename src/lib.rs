//! FreshMart storefront core.
//!
//! The interesting part is the cart/inventory/order consistency
//! subsystem: two cart backends behind one contract ([`cart`]), the
//! atomic checkout unit of work ([`checkout`] over [`storage`]), and
//! the order lifecycle state machine ([`orders`]). Everything else is a
//! collaborator behind a narrow trait ([`services`]).

pub mod cart;
pub mod checkout;
pub mod config;
pub mod errors;
pub mod models;
pub mod orders;
pub mod services;
pub mod state;
pub mod storage;
pub mod views;
pub mod web;
