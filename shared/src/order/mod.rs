//! Order aggregate and its supporting types

pub mod order;
pub mod types;

pub use order::Order;
pub use types::{
    ContactPreference, CustomerInfo, DeliveryMethod, LineItem, OrderMessage, OrderStatus,
    PaymentStatus, ShippingAddress, StatusEntry,
};
