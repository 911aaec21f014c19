//! mostrador store-server — order & inventory reconciliation core
//!
//! Owns the order lifecycle (creation, status transitions, archiving), the
//! inventory ledger (non-negative stock with an audit log), the
//! coupon/promotion evaluator, and the mapping of payment-gateway events
//! onto lifecycle transitions. Presentation, HTTP routing and the gateway
//! wire client live outside this crate.

pub mod catalog;
pub mod config;
pub mod discounts;
pub mod ledger;
pub mod lifecycle;
pub mod money;
pub mod notify;
pub mod reconcile;
pub mod storage;
pub mod utils;
