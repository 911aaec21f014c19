//! Catalog and discount models

pub mod coupon;
pub mod discount;
pub mod product;
pub mod promotion;

pub use coupon::{Coupon, CouponCreate, CouponUpdate};
pub use discount::{DiscountType, ProductScope};
pub use product::{Product, ProductCreate, ProductSummary, ProductUpdate};
pub use promotion::{Promotion, PromotionCondition, PromotionCreate, PromotionUpdate};
