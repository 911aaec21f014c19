//! Shared domain types for the mostrador storefront core
//!
//! This crate holds the data model (products, coupons, promotions, orders)
//! and small utilities (timestamps, IDs, tracking tokens). It is pure
//! data + serde; all storage and business logic lives in `store-server`.

pub mod models;
pub mod order;
pub mod util;
